//! Timestamp helpers.
//!
//! Timestamps travel as Unix milliseconds internally. On the wire, chat
//! messages use the ISO-8601 UTC form a browser produces for a `Date`;
//! HTTP listings use RFC 3339 in KST, where the service is operated.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};

/// KST is UTC+9
const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Get the current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a Unix millisecond timestamp like `Date.prototype.toJSON`
/// (`2024-01-01T00:00:00.000Z`).
///
/// Out-of-range values fall back to the epoch.
pub fn millis_to_iso8601(millis: i64) -> String {
    let datetime = Utc
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format a Unix millisecond timestamp as RFC 3339 in KST.
pub fn millis_to_kst_rfc3339(millis: i64) -> String {
    let utc = Utc
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    match FixedOffset::east_opt(KST_OFFSET_SECS) {
        Some(kst) => utc.with_timezone(&kst).to_rfc3339(),
        None => utc.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_to_iso8601_matches_browser_format() {
        // テスト項目: ブラウザの Date.toJSON と同じ形式で出力される
        // given (前提条件):
        let millis = 1_704_067_200_123; // 2024-01-01T00:00:00.123Z

        // when (操作):
        let formatted = millis_to_iso8601(millis);

        // then (期待する結果):
        assert_eq!(formatted, "2024-01-01T00:00:00.123Z");
    }

    #[test]
    fn test_millis_to_kst_rfc3339() {
        // テスト項目: KST (+09:00) の RFC 3339 形式で出力される
        // given (前提条件):
        let millis = 1_704_067_200_000;

        // when (操作):
        let formatted = millis_to_kst_rfc3339(millis);

        // then (期待する結果):
        assert_eq!(formatted, "2024-01-01T09:00:00+09:00");
    }

    #[test]
    fn test_now_millis_is_recent() {
        // テスト項目: 現在時刻が 2024 年以降である
        assert!(now_millis() > 1_704_067_200_000);
    }
}
