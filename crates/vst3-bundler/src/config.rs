//! `vst3-bundler.json`: the plugins a repository builds, and how.
//!
//! ```json
//! {
//!   "toolchain": { "env_script": "C:/.../vcvars64.bat" },
//!   "defaults": { "target_triple": "x86_64-pc-windows-msvc" },
//!   "plugins": [
//!     { "plugin_name": "hello_vst", "bundle_name": "HelloVst", "source_root": "hello_vst" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::descriptor::{default_bundle_name, PluginDescriptor};
use crate::error::ConfigError;
use crate::pipeline::PipelineConfig;
use crate::stages::PackagingConfig;
use crate::target::{BuildTarget, Profile, DEFAULT_TRIPLE};
use crate::toolchain::ToolchainConfig;

pub const DEFAULT_CONFIG_FILE: &str = "vst3-bundler.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub toolchain: ToolchainConfig,
    pub packaging: PackagingConfig,
    pub defaults: Defaults,
    pub plugins: Vec<PluginEntry>,
    /// Directory relative source roots resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    pub target_triple: Option<String>,
    pub profile: Option<Profile>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginEntry {
    pub plugin_name: String,
    #[serde(default)]
    pub bundle_name: Option<String>,
    #[serde(default)]
    pub binary_name: Option<String>,
    #[serde(default)]
    pub source_root: Option<PathBuf>,
    #[serde(default)]
    pub target_triple: Option<String>,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl PluginEntry {
    pub fn named(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            ..Self::default()
        }
    }
}

/// Values given on the command line. They win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub bundle_name: Option<String>,
    pub binary_name: Option<String>,
    pub target_triple: Option<String>,
    pub profile: Option<Profile>,
    pub source_root: Option<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(text)?;
        config.base_dir = PathBuf::from(".");
        Ok(config)
    }

    /// An explicit path must exist; otherwise `vst3-bundler.json` in `dir`
    /// is used when present.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path).map(Some);
        }
        let default = dir.join(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            Self::load(&default).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn entry(&self, plugin_name: &str) -> Result<&PluginEntry, ConfigError> {
        self.plugins
            .iter()
            .find(|p| p.plugin_name == plugin_name)
            .ok_or_else(|| ConfigError::UnknownPlugin(plugin_name.to_string()))
    }

    /// Merge command line, plugin entry, file defaults and built-in defaults,
    /// in that order of precedence.
    pub fn resolve(
        &self,
        entry: &PluginEntry,
        overrides: &Overrides,
    ) -> Result<PipelineConfig, ConfigError> {
        let triple = overrides
            .target_triple
            .as_deref()
            .or(entry.target_triple.as_deref())
            .or(self.defaults.target_triple.as_deref())
            .unwrap_or(DEFAULT_TRIPLE);
        let profile = overrides
            .profile
            .or(entry.profile)
            .or(self.defaults.profile)
            .unwrap_or_default();
        let target = BuildTarget::new(triple, profile)?;

        let bundle_name = overrides
            .bundle_name
            .clone()
            .or_else(|| entry.bundle_name.clone())
            .unwrap_or_else(|| default_bundle_name(&entry.plugin_name));
        let mut plugin = PluginDescriptor::derive(&entry.plugin_name, bundle_name, &target);
        if let Some(binary) = overrides.binary_name.clone().or_else(|| entry.binary_name.clone()) {
            plugin.binary_name = binary;
        }
        plugin.validate()?;

        let base_dir = if self.base_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            self.base_dir.as_path()
        };
        let source_root = match (&overrides.source_root, &entry.source_root) {
            (Some(root), _) => root.clone(),
            (None, Some(root)) => base_dir.join(root),
            (None, None) => base_dir.to_path_buf(),
        };

        if self.packaging.enabled && self.packaging.command.is_empty() {
            return Err(ConfigError::EmptyPackagingCommand);
        }
        // Children run inside the source root, so a relative path would not
        // name the program that was located.
        let cargo = Path::new(&self.toolchain.cargo);
        if cargo.is_relative() && cargo.components().count() > 1 {
            return Err(ConfigError::RelativeCargoPath(self.toolchain.cargo.clone()));
        }

        Ok(PipelineConfig {
            plugin,
            target,
            source_root,
            toolchain: self.toolchain.clone(),
            packaging: self.packaging.clone(),
        })
    }
}
