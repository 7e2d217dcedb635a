//! Runtime configuration: which `studio` binary to run, where sites live,
//! and an optional per-call timeout.
//!
//! Resolution order for every setting: CLI flag > environment > config file > default.
//!
//! parse_command -> CommandSpec { program, args }
//! StudioConfig::resolve(&Overrides)
//!
use serde::Deserialize;
use shell_words::split as shell_split;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::utils::{expand_home, home_dir};

pub const DEFAULT_COMMAND: &str = "studio";
pub const DEFAULT_SITES_DIR_NAME: &str = "Studio";

pub const ENV_COMMAND: &str = "STUDIO_CLI";
pub const ENV_SITES_DIR: &str = "STUDIO_SITES_DIR";
pub const ENV_TIMEOUT: &str = "STUDIO_CLI_TIMEOUT";
pub const ENV_CONFIG: &str = "STUDIO_MCP_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("studio command is empty")]
    EmptyCommand,

    #[error("failed to parse studio command '{raw}': {source}")]
    CommandSplit {
        raw: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid timeout '{raw}' (expected whole seconds)")]
    InvalidTimeout { raw: String },
}

/// The external program plus any leading arguments, already shell-split.
///
/// `node /opt/studio/cli.js` -> program `node`, args `["/opt/studio/cli.js"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Split a command line with shell rules. Rejects empty input.
pub fn parse_command(raw: &str) -> Result<CommandSpec, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyCommand);
    }
    let parts = shell_split(trimmed).map_err(|source| ConfigError::CommandSplit {
        raw: raw.to_string(),
        source,
    })?;
    let Some((program, args)) = parts.split_first() else {
        return Err(ConfigError::EmptyCommand);
    };
    if program.is_empty() {
        return Err(ConfigError::EmptyCommand);
    }
    Ok(CommandSpec {
        program: program.clone(),
        args: args.to_vec(),
    })
}

/// On-disk config (JSON or YAML, picked by extension).
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub command: Option<String>,
    pub sites_dir: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let lower = path.to_string_lossy().to_ascii_lowercase();
        let parsed = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(raw).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(raw).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Values supplied on the command line; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub command: Option<String>,
    pub sites_dir: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved configuration handed to the server at startup.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub command: CommandSpec,
    pub sites_dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec {
                program: DEFAULT_COMMAND.to_string(),
                args: Vec::new(),
            },
            sites_dir: home_dir().join(DEFAULT_SITES_DIR_NAME),
            timeout: None,
        }
    }
}

impl StudioConfig {
    /// Resolve against the process environment.
    pub fn resolve(cli: &Overrides) -> Result<Self, ConfigError> {
        Self::resolve_with(cli, |key| {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        })
    }

    /// Resolve with an injectable environment lookup.
    pub fn resolve_with(
        cli: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let config_path = cli
            .config_path
            .clone()
            .or_else(|| env(ENV_CONFIG).map(|p| expand_home(&p)));
        let file = match config_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                FileConfig::load(&path)?
            }
            None => FileConfig::default(),
        };

        let command_raw = cli
            .command
            .clone()
            .or_else(|| env(ENV_COMMAND))
            .or(file.command)
            .unwrap_or_else(|| DEFAULT_COMMAND.to_string());
        let command = parse_command(&command_raw)?;

        let sites_dir = cli
            .sites_dir
            .clone()
            .or_else(|| env(ENV_SITES_DIR))
            .or(file.sites_dir)
            .map(|d| expand_home(d.trim()))
            .unwrap_or_else(|| home_dir().join(DEFAULT_SITES_DIR_NAME));

        let timeout_secs = match cli.timeout_secs {
            Some(secs) => Some(secs),
            None => match env(ENV_TIMEOUT) {
                Some(raw) => Some(
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::InvalidTimeout { raw })?,
                ),
                None => file.timeout_secs,
            },
        };
        // 0 disables the timeout.
        let timeout = timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs);

        Ok(Self {
            command,
            sites_dir,
            timeout,
        })
    }

    /// The command the user must run by hand to log in.
    pub fn login_command(&self) -> String {
        format!("{} auth login", self.command)
    }
}
