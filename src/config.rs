//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/reqtree/reqtree.toml`
//! 3. Local config: `<store_dir>/.reqtree.toml` (store directory, not cwd)
//! 4. Environment variables: `REQTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Interactive wizard configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WizardConfig {
    /// Leave levels without condition choices without prompting
    pub auto_skip_empty: bool,
    /// Prompt prefix shown by the selector
    pub prompt: String,
    /// Selector window height (skim syntax, e.g. "50%")
    pub height: String,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            auto_skip_empty: true,
            prompt: "reqtree>".into(),
            height: "50%".into(),
        }
    }
}

/// Raw wizard config for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawWizardConfig {
    pub auto_skip_empty: Option<bool>,
    pub prompt: Option<String>,
    pub height: Option<String>,
}

impl WizardConfig {
    /// Overlay wins where it specifies a value.
    pub fn merge(&self, overlay: &RawWizardConfig) -> Self {
        Self {
            auto_skip_empty: overlay.auto_skip_empty.unwrap_or(self.auto_skip_empty),
            prompt: overlay
                .prompt
                .clone()
                .unwrap_or_else(|| self.prompt.clone()),
            height: overlay
                .height
                .clone()
                .unwrap_or_else(|| self.height.clone()),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_dir: Option<PathBuf>,
    #[serde(default)]
    pub wizard: RawWizardConfig,
}

/// Unified configuration for reqtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one `<key>.json` document per transaction (default: ~/.reqtree)
    pub store_dir: PathBuf,
    /// Interactive wizard settings
    pub wizard: WizardConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            wizard: WizardConfig::default(),
        }
    }
}

/// Get the default store directory (~/.reqtree).
fn default_store_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".reqtree"))
        .unwrap_or_else(|| PathBuf::from("~/.reqtree"))
}

/// Get the XDG config directory for reqtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "reqtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("reqtree.toml"))
}

/// Get the path to the local config file in a store directory.
pub fn local_config_path(store_dir: &Path) -> PathBuf {
    store_dir.join(".reqtree.toml")
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

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input untouched.
fn expand(input: &str) -> String {
    shellexpand::full(input)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand(self.store_dir.to_string_lossy().as_ref());
        self.store_dir = PathBuf::from(expanded);
    }

    /// Overlay scalars win where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            store_dir: overlay
                .store_dir
                .clone()
                .unwrap_or_else(|| self.store_dir.clone()),
            wizard: self.wizard.merge(&overlay.wizard),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `store_dir` - Optional store directory for local config
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/reqtree/reqtree.toml`
    /// 3. Local config: `<store_dir>/.reqtree.toml`
    /// 4. Environment variables: `REQTREE_*` prefix
    ///
    /// Without an explicit `store_dir`, the local config is looked up in the
    /// store directory resolved from the first two layers.
    pub fn load(store_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config in the store directory
        let local_dir = match store_dir {
            Some(dir) => dir.to_path_buf(),
            None => {
                let mut probe = current.clone();
                probe.expand_paths();
                probe.store_dir
            }
        };
        let local_path = local_config_path(&local_dir);
        if local_path.exists() {
            let raw = load_raw_settings(&local_path)?;
            current = current.merge_with(&raw);
        }
        if let Some(dir) = store_dir {
            current.store_dir = dir.to_path_buf();
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply REQTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("REQTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("store_dir") {
            settings.store_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_bool("wizard.auto_skip_empty") {
            settings.wizard.auto_skip_empty = val;
        }
        if let Ok(val) = config.get_string("wizard.prompt") {
            settings.wizard.prompt = val;
        }
        if let Ok(val) = config.get_string("wizard.height") {
            settings.wizard.height = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# reqtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/reqtree/reqtree.toml
#   Local:  <store_dir>/.reqtree.toml
#   Env:    REQTREE_* environment variables (nested keys use "__",
#           e.g. REQTREE_WIZARD__PROMPT)

# Directory holding one <key>.json document per transaction
# store_dir = "~/.reqtree"

[wizard]
# Skip drill-down levels that offer no condition to pick
# auto_skip_empty = true

# Prompt prefix
# prompt = "reqtree>"

# Selector window height
# height = "50%"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
