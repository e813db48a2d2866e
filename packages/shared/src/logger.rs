//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Without it, `default_level` applies to the
/// binary's own crate and `warn` applies to everything else.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(bin_name, default_level)));

    // A second call (e.g. from several tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

fn default_directives(bin_name: &str, default_level: &str) -> String {
    let crate_name = bin_name.replace('-', "_");
    format!("warn,{crate_name}={default_level},madang_shared={default_level},tower_http={default_level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_normalizes_bin_name() {
        // テスト項目: バイナリ名のハイフンがクレート名のアンダースコアに変換される
        // when (操作):
        let directives = default_directives("madang-server", "debug");

        // then (期待する結果):
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("madang_server=debug"));
        assert!(directives.contains("tower_http=debug"));
    }

    #[test]
    fn test_setup_logger_twice_does_not_panic() {
        // テスト項目: 2 回目の初期化でもパニックしない
        setup_logger("madang-server", "info");
        setup_logger("madang-server", "debug");
    }
}
