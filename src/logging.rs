use std::path::Path;

use anyhow::Result;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub const CLI_PREFIX: &str = "cli";
pub const TUI_PREFIX: &str = "tui";

/// Daily rolling log files under `log_dir`. The TUI owns the terminal, so stderr is only
/// mirrored when `show_stderr` is set (CLI `--verbose`).
pub fn enable_logging(prefix: &str, log_dir: &Path, level: &str, show_stderr: bool) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(7)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)?;

    let stderr = std::io::stderr.with_filter(move |_| show_stderr);

    let directives = filter_directives(std::env::var("RUST_LOG").ok(), level);

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(directives)?)
        .with_ansi(false)
        .with_writer(stderr.and(appender))
        .init();
    Ok(())
}

/// `RUST_LOG` is taken as a complete filter. Without it, only this crate logs, at `level`.
fn filter_directives(rust_log: Option<String>, level: &str) -> String {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => directives,
        _ => format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_")),
    }
}

#[cfg(test)]
pub static TEST_LOGGING: std::sync::LazyLock<()> = std::sync::LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(tracing::level_filters::LevelFilter::TRACE)
        .with_test_writer()
        .init()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_is_used_as_is() {
        assert_eq!(
            filter_directives(Some("debug,hyper=warn".into()), "info"),
            "debug,hyper=warn"
        );
        assert!(tracing_subscriber::EnvFilter::try_new("debug,hyper=warn").is_ok());
    }

    #[test]
    fn configured_level_applies_to_this_crate() {
        assert_eq!(filter_directives(None, "info"), "worktracker=info");
        assert_eq!(filter_directives(Some(" ".into()), "warn"), "worktracker=warn");
    }
}
