//! Log output for the server.
//!
//! stdout carries the protocol, so logs always go to stderr. `RUST_LOG`
//! refines the default `bblang_lsp=info` level.

use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` does not mention this crate.
pub const DEFAULT_DIRECTIVE: &str = "bblang_lsp=info";

/// Build the filter from `RUST_LOG` plus [`DEFAULT_DIRECTIVE`].
pub fn env_filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match DEFAULT_DIRECTIVE.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_parses() {
        assert!(DEFAULT_DIRECTIVE
            .parse::<tracing_subscriber::filter::Directive>()
            .is_ok());
    }

    #[test]
    fn test_init_twice() {
        init_logging();
        init_logging();
    }
}
