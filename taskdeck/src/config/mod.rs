//! Configuration system for the `TaskDeck` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdeck/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use taskdeck_model::task::DEFAULT_MAX_TEXT_LENGTH;
use taskdeck_model::user::{AuthUser, UserId};

use crate::sync::SyncConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    user: UserFileConfig,
    tasks: TasksFileConfig,
    ui: UiFileConfig,
    sync: SyncFileConfig,
}

/// `[user]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UserFileConfig {
    id: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}

/// `[tasks]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TasksFileConfig {
    max_text_len: Option<usize>,
    optimistic_delete: Option<bool>,
    confirm_delete: Option<bool>,
    data_file: Option<String>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    notice_ttl_secs: Option<u64>,
}

/// `[sync]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SyncFileConfig {
    command_capacity: Option<usize>,
    event_capacity: Option<usize>,
    snapshot_buffer: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- User --
    /// Identity id used by the local provider.
    pub user_id: String,
    /// Display name shown in the header after sign-in.
    pub display_name: String,
    /// Optional avatar URL (shown as initials in the terminal).
    pub photo_url: Option<String>,

    // -- Tasks --
    /// Maximum task text length in characters.
    pub max_text_len: usize,
    /// Remove rows locally before the delete is acknowledged.
    pub optimistic_delete: bool,
    /// Ask for confirmation before deleting a task.
    pub confirm_delete: bool,
    /// Path of the JSON file the local collection persists to. `None`
    /// keeps tasks in memory only.
    pub data_file: Option<PathBuf>,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// How long a notice stays in the status bar.
    pub notice_ttl: Duration,

    // -- Sync --
    /// Capacity of the command channel into the sync loop.
    pub command_capacity: usize,
    /// Capacity of the event channel out of the sync loop.
    pub event_capacity: usize,
    /// Buffer for the live subscription's snapshot channel.
    pub snapshot_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
            display_name: "Local User".to_string(),
            photo_url: None,
            max_text_len: DEFAULT_MAX_TEXT_LENGTH,
            optimistic_delete: false,
            confirm_delete: true,
            data_file: None,
            poll_timeout: Duration::from_millis(50),
            notice_ttl: Duration::from_secs(4),
            command_capacity: 64,
            event_capacity: 256,
            snapshot_buffer: 32,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Without `--config`, the default path
    /// (`~/.config/taskdeck/config.toml`) is tried and silently ignored
    /// if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. Separated from `load()` to enable
    /// unit testing without CLI parsing.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            user_id: cli
                .user_id
                .clone()
                .or_else(|| file.user.id.clone())
                .unwrap_or(defaults.user_id),
            display_name: cli
                .user_name
                .clone()
                .or_else(|| file.user.display_name.clone())
                .unwrap_or(defaults.display_name),
            photo_url: file.user.photo_url.clone(),
            max_text_len: file.tasks.max_text_len.unwrap_or(defaults.max_text_len),
            optimistic_delete: file
                .tasks
                .optimistic_delete
                .unwrap_or(defaults.optimistic_delete),
            confirm_delete: file.tasks.confirm_delete.unwrap_or(defaults.confirm_delete),
            data_file: cli
                .data_file
                .clone()
                .or_else(|| file.tasks.data_file.clone().map(PathBuf::from)),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            notice_ttl: file
                .ui
                .notice_ttl_secs
                .map_or(defaults.notice_ttl, Duration::from_secs),
            command_capacity: file
                .sync
                .command_capacity
                .unwrap_or(defaults.command_capacity),
            event_capacity: file.sync.event_capacity.unwrap_or(defaults.event_capacity),
            snapshot_buffer: file.sync.snapshot_buffer.unwrap_or(defaults.snapshot_buffer),
        }
    }

    /// Build the sync loop's tuning knobs from this configuration.
    #[must_use]
    pub const fn to_sync_config(&self) -> SyncConfig {
        SyncConfig {
            command_capacity: self.command_capacity,
            event_capacity: self.event_capacity,
            snapshot_buffer: self.snapshot_buffer,
            max_text_len: self.max_text_len,
            optimistic_delete: self.optimistic_delete,
        }
    }

    /// Profile the local identity provider signs in as.
    #[must_use]
    pub fn auth_profile(&self) -> AuthUser {
        AuthUser {
            id: UserId::new(&self.user_id),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal-native task list with live sync")]
pub struct CliArgs {
    /// Identity id used by the local provider.
    #[arg(long, env = "TASKDECK_USER")]
    pub user_id: Option<String>,

    /// Display name shown after sign-in.
    #[arg(long, env = "TASKDECK_NAME")]
    pub user_name: Option<String>,

    /// Path of the JSON file tasks are persisted to.
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Path to config file (default: `~/.config/taskdeck/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDECK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdeck.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and a missing
/// file is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            // No config dir available — use defaults.
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskdeck").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
