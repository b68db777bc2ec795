//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/muster/muster.toml`
//! 3. Local config: `<project_dir>/.muster.toml`
//! 4. Environment variables: `MUSTER_*` prefix
//!
//! Command line flags are applied on top by the CLI.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::NameOrder;

const ENV_PREFIX: &str = "MUSTER";

/// Unified configuration for muster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Roster file to load (relative paths resolve against the project directory)
    pub roster: PathBuf,
    /// Name comparison used by the roster index
    pub name_matching: NameOrder,
    /// Maximum attack exchanges in a `fight`
    pub max_rounds: u32,
    /// Fixed dice seed for reproducible fights
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roster: PathBuf::from("army.txt"),
            name_matching: NameOrder::CaseSensitive,
            max_rounds: 5,
            seed: None,
        }
    }
}

/// Raw settings for intermediate parsing.
///
/// `None` means "not specified in this layer, inherit from below".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub roster: Option<PathBuf>,
    pub name_matching: Option<NameOrder>,
    pub max_rounds: Option<u32>,
    pub seed: Option<u64>,
}

/// Get the XDG config directory for muster.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "muster").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("muster.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".muster.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input untouched.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn parse_name_order(value: &str) -> Result<NameOrder, ApplicationError> {
    match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "case-sensitive" => Ok(NameOrder::CaseSensitive),
        "case-insensitive" => Ok(NameOrder::CaseInsensitive),
        other => Err(ApplicationError::Config {
            message: format!(
                "name_matching must be case-sensitive or case-insensitive, got {other}"
            ),
        }),
    }
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins if specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            roster: overlay.roster.clone().unwrap_or_else(|| self.roster.clone()),
            name_matching: overlay.name_matching.unwrap_or(self.name_matching),
            max_rounds: overlay.max_rounds.unwrap_or(self.max_rounds),
            seed: overlay.seed.or(self.seed),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), project_dir)
    }

    /// Load settings with an explicit global config path.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!("loading global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(global_path)?);
            }
        }

        // 3. Project-local config
        if let Some(project) = project_dir {
            let local_path = local_config_path(project);
            if local_path.exists() {
                debug!("loading local config: {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current, ENV_PREFIX)?;

        current.roster = expand_path(&current.roster);
        current.validate()?;
        Ok(current)
    }

    /// Apply `<PREFIX>_*` environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, prefix: &str) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("roster") {
            settings.roster = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("name_matching") {
            settings.name_matching = parse_name_order(&val)?;
        }
        if let Ok(val) = config.get_string("max_rounds") {
            settings.max_rounds = val.parse().map_err(|_| ApplicationError::Config {
                message: format!("max_rounds must be a positive integer, got {val}"),
            })?;
        }
        if let Ok(val) = config.get_string("seed") {
            settings.seed = Some(val.parse().map_err(|_| ApplicationError::Config {
                message: format!("seed must be an unsigned integer, got {val}"),
            })?);
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.max_rounds == 0 {
            return Err(ApplicationError::Config {
                message: "max_rounds must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Roster path, resolved against `project_dir` when relative.
    pub fn roster_path(&self, project_dir: &Path) -> PathBuf {
        if self.roster.is_absolute() {
            self.roster.clone()
        } else {
            project_dir.join(&self.roster)
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# muster configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/muster/muster.toml
#   Local:  <project_dir>/.muster.toml
#   Env:    MUSTER_* environment variables (e.g. MUSTER_MAX_ROUNDS=3)

# Roster file, relative to the project directory unless absolute
# roster = "army.txt"

# Unit name matching: "case-sensitive" or "case-insensitive"
# name_matching = "case-sensitive"

# Maximum attack exchanges in a fight
# max_rounds = 5

# Fixed dice seed for reproducible fights
# seed = 42
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
