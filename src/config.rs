/*
 * Copyright (C) 2026 Mark Wells Dev
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use crate::coordinator::Cadence;
use crate::lint::CommandLinter;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Master switch. While false no file is tracked (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Quiet period after the last edit before linting, in ms (default: 500)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Poll interval while enabled, in ms (default: 500)
    #[serde(default = "default_active_interval_ms")]
    pub active_interval_ms: u64,

    /// Poll interval while disabled, in ms (default: 2000)
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,

    /// File extensions to lint (e.g., "go"). Empty means every file.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// External linter command
    #[serde(default)]
    pub linter: Option<LinterConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LinterConfig {
    /// The command to execute (e.g., "golint")
    pub command: String,

    /// Arguments placed before the file path
    #[serde(default)]
    pub args: Vec<String>,
}

const fn default_enabled() -> bool {
    true
}

const fn default_timeout_ms() -> u64 {
    500
}

const fn default_active_interval_ms() -> u64 {
    500
}

const fn default_idle_interval_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timeout_ms: default_timeout_ms(),
            active_interval_ms: default_active_interval_ms(),
            idle_interval_ms: default_idle_interval_ms(),
            extensions: Vec::new(),
            linter: None,
        }
    }
}

impl Config {
    /// Load configuration from standard paths or a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be parsed or holds values of
    /// the wrong type.
    pub fn load(explicit_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // 1. Start with defaults
        builder = builder
            .set_default("enabled", default_enabled())?
            .set_default("timeout_ms", default_timeout_ms())?
            .set_default("active_interval_ms", default_active_interval_ms())?
            .set_default("idle_interval_ms", default_idle_interval_ms())?;

        // 2. Load from user config directory (~/.config/lintwatch/config.toml)
        if let Some(path) = user_config_path()
            && path.exists()
        {
            builder = builder.add_source(config::File::from(path));
        }

        // 3. Load from explicit file if provided
        if let Some(path) = explicit_file {
            builder = builder.add_source(config::File::from(path));
        }

        // 4. Load from environment variables (LINTWATCH_TIMEOUT_MS, etc.)
        builder = builder.add_source(config::Environment::with_prefix("LINTWATCH"));

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// The settings polled by the coordinator on every tick.
    #[must_use]
    pub const fn settings(&self) -> LintSettings {
        LintSettings {
            enabled: self.enabled,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    /// Poll intervals.
    #[must_use]
    pub const fn cadence(&self) -> Cadence {
        Cadence {
            active: Duration::from_millis(self.active_interval_ms),
            idle: Duration::from_millis(self.idle_interval_ms),
        }
    }

    /// The configured linter, if any.
    #[must_use]
    pub fn linter(&self) -> Option<CommandLinter> {
        self.linter
            .as_ref()
            .map(|l| CommandLinter::new(l.command.clone(), l.args.clone()))
    }
}

/// Path of the per-user config file.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lintwatch").join("config.toml"))
}

/// The part of the configuration the poll loop reads on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LintSettings {
    /// Whether linting is enabled.
    pub enabled: bool,
    /// Debounce timeout.
    pub timeout: Duration,
}

impl Default for LintSettings {
    fn default() -> Self {
        Config::default().settings()
    }
}

/// Supplies the current [`LintSettings`].
pub trait SettingsSource: Send + Sync {
    /// The settings in effect right now.
    fn settings(&self) -> LintSettings;
}

impl SettingsSource for LintSettings {
    fn settings(&self) -> LintSettings {
        *self
    }
}

impl SettingsSource for Config {
    fn settings(&self) -> LintSettings {
        Self::settings(self)
    }
}

/// Command-line values that take precedence over every config source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Force linting off.
    pub disable: bool,
    /// Debounce timeout in ms.
    pub timeout_ms: Option<u64>,
    /// Linter command line, e.g. `"golint -json"`.
    pub linter: Option<String>,
}

impl Overrides {
    /// Applies the overrides to `config`.
    pub fn apply(&self, config: &mut Config) {
        if self.disable {
            config.enabled = false;
        }
        if let Some(timeout) = self.timeout_ms {
            config.timeout_ms = timeout;
        }
        if let Some(linter) = self.linter.as_deref().and_then(CommandLinter::parse) {
            config.linter = Some(LinterConfig {
                command: linter.command().to_string(),
                args: linter.args().to_vec(),
            });
        }
    }
}

struct Loaded {
    config: Config,
    stamps: Vec<Option<SystemTime>>,
}

/// Settings that follow edits to the config files.
///
/// Each call compares the modification times of the config files with
/// those seen at the last load and reloads when any changed. A failed
/// reload keeps the previous settings.
pub struct ReloadingSettings {
    explicit: Option<PathBuf>,
    overrides: Overrides,
    loaded: Mutex<Loaded>,
}

impl ReloadingSettings {
    /// Loads the configuration once.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load fails.
    pub fn new(explicit: Option<PathBuf>, overrides: Overrides) -> Result<Self> {
        let stamps = stamps(&watched_paths(explicit.as_deref()));
        let mut config = Config::load(explicit.as_deref())?;
        overrides.apply(&mut config);
        Ok(Self {
            explicit,
            overrides,
            loaded: Mutex::new(Loaded { config, stamps }),
        })
    }

    /// The configuration currently in effect.
    #[must_use]
    pub fn config(&self) -> Config {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .config
            .clone()
    }
}

impl SettingsSource for ReloadingSettings {
    fn settings(&self) -> LintSettings {
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        let current = stamps(&watched_paths(self.explicit.as_deref()));

        if current != loaded.stamps {
            loaded.stamps = current;
            match Config::load(self.explicit.as_deref()) {
                Ok(mut config) => {
                    self.overrides.apply(&mut config);
                    if config != loaded.config {
                        info!("Configuration reloaded");
                    }
                    loaded.config = config;
                }
                Err(e) => warn!("Keeping previous configuration: {e:#}"),
            }
        }

        loaded.config.settings()
    }
}

fn watched_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    user_config_path()
        .into_iter()
        .chain(explicit.map(Path::to_path_buf))
        .collect()
}

fn stamps(paths: &[PathBuf]) -> Vec<Option<SystemTime>> {
    paths
        .iter()
        .map(|p| std::fs::metadata(p).and_then(|m| m.modified()).ok())
        .collect()
}
