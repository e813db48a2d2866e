//! HTTP API response DTOs for the chat relay.

use serde::{Deserialize, Serialize};

use crate::domain::Participant;

/// Participant listing for `/api/participants`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantListDto {
    /// Open connections, joined or not
    pub connections: usize,
    pub participants: Vec<ParticipantDto>,
}

/// One joined participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub connection_id: String,
    pub display_name: String,
    pub joined_at: String, // RFC 3339, KST
}

impl From<&Participant> for ParticipantDto {
    fn from(participant: &Participant) -> Self {
        Self {
            connection_id: participant.connection_id.as_str().to_string(),
            display_name: participant.display_name.as_str().to_string(),
            joined_at: madang_shared::time::millis_to_kst_rfc3339(participant.joined_at.value()),
        }
    }
}
