//! Domain factories for creating identifiers.

use std::sync::atomic::{AtomicI64, Ordering};

use super::{ConnectionId, MessageId};

/// Factory for generating ConnectionId instances.
///
/// This factory encapsulates the logic for generating new connection
/// identifiers, separating the generation concern from the validation logic
/// in ConnectionId.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    pub fn generate() -> ConnectionId {
        ConnectionId::from_uuid(uuid::Uuid::new_v4())
    }
}

/// Factory for system message ids.
///
/// Ids follow the wall clock in milliseconds, like the ids browsers assign
/// with `Date.now()`, but never repeat: two messages in the same millisecond
/// get consecutive values.
#[derive(Debug, Default)]
pub struct MessageIdFactory {
    last: AtomicI64,
}

impl MessageIdFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id given the current time in milliseconds.
    pub fn next_at(&self, now_millis: i64) -> MessageId {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_millis.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return MessageId::new(candidate),
                Err(actual) => current = actual,
            }
        }
    }

    /// Next id based on the wall clock.
    pub fn next(&self) -> MessageId {
        self.next_at(madang_shared::time::now_millis())
    }
}
