//! `tracing` output routed to the browser console.
//!
//! In the browser the fmt layer writes through `tracing-web`, which picks
//! `console.error`/`warn`/`info`/`debug` by event level. Host builds (tests)
//! write to stderr.

use crate::config::ViewerConfig;

#[cfg(target_arch = "wasm32")]
fn console_writer() -> tracing_web::MakeWebConsoleWriter {
    tracing_web::MakeWebConsoleWriter::new()
}

#[cfg(not(target_arch = "wasm32"))]
fn console_writer() -> fn() -> std::io::Stderr {
    std::io::stderr
}

/// Installs the console subscriber. Later calls are no-ops and return false.
pub fn init_logging(config: &ViewerConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter())
        .without_time()
        .with_ansi(false)
        .with_writer(console_writer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        let config = ViewerConfig::default();
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}
