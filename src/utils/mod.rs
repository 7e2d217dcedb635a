//! Utilities: logging setup (verbosity flags -> tracing filter) and small
//! path helpers shared by config and server.
//!
//! Key items:
//!   init_logging / derive_level
//!   expand_home

use std::path::PathBuf;

/// Logging helpers.
///
/// Everything goes to stderr: stdout carries the MCP JSON-RPC stream.
pub mod logging {
    use tracing_subscriber::EnvFilter;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Info = 1,
        Debug = 2,
        Trace = 3,
    }

    impl LogLevel {
        pub fn as_str(&self) -> &'static str {
            match self {
                LogLevel::Error => "error",
                LogLevel::Info => "info",
                LogLevel::Debug => "debug",
                LogLevel::Trace => "trace",
            }
        }
    }

    pub fn derive_level(verbose: u8, quiet: bool) -> LogLevel {
        if quiet {
            return LogLevel::Error;
        }
        match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Build the filter: `RUST_LOG` wins when set, otherwise the flag level
    /// applies to this crate and `warn` to everything else (rmcp is chatty).
    pub fn build_filter(level: LogLevel) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("warn,studio_mcp={}", level.as_str()))
        })
    }

    pub fn init_logging(level: LogLevel) {
        // try_init: a second call (tests) must not panic.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(build_filter(level))
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(false)
            .try_init();
    }
}

pub use logging::{derive_level, init_logging};

/// Expand a leading `~` / `~/` against `$HOME`. Other paths pass through.
pub fn expand_home(raw: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (raw, home) {
        ("~", Some(h)) => h,
        (r, Some(h)) if r.starts_with("~/") => h.join(&r[2..]),
        (r, _) => PathBuf::from(r),
    }
}

/// `$HOME`, falling back to the temp dir when unset.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            tracing::warn!("HOME not set, falling back to temp directory");
            std::env::temp_dir()
        })
}
