//! Plugin identity: the cargo package, the file cargo emits for it, and the
//! name of the `.vst3` bundle.

use crate::error::ConfigError;
use crate::target::{BuildTarget, TargetOs};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Cargo package name, also handed to the packaging helper.
    pub plugin_name: String,
    /// File name of the compiled `cdylib`, exactly as cargo writes it.
    pub binary_name: String,
    /// Bundle name without the `.vst3` suffix.
    pub bundle_name: String,
}

impl PluginDescriptor {
    /// Derive the binary name the way cargo names a `cdylib` for `target`.
    pub fn derive(
        plugin_name: impl Into<String>,
        bundle_name: impl Into<String>,
        target: &BuildTarget,
    ) -> Self {
        let plugin_name = plugin_name.into();
        let binary_name = cdylib_file_name(&plugin_name, target.os());
        Self {
            plugin_name,
            binary_name,
            bundle_name: bundle_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_name("plugin name", &self.plugin_name)?;
        check_name("binary name", &self.binary_name)?;
        check_name("bundle name", &self.bundle_name)
    }

    /// `<bundle>.vst3` directory name.
    pub fn bundle_dir_name(&self) -> String {
        format!("{}.vst3", self.bundle_name)
    }

    /// Name the binary takes inside `Contents/<platform-dir>/`.
    pub fn bundle_binary_name(&self, os: TargetOs) -> String {
        match os {
            TargetOs::Windows => format!("{}.vst3", self.bundle_name),
            TargetOs::Linux => format!("{}.so", self.bundle_name),
            TargetOs::MacOs => self.bundle_name.clone(),
        }
    }
}

/// `hello-vst` -> `hello_vst.dll` / `libhello_vst.so` / `libhello_vst.dylib`
pub fn cdylib_file_name(package: &str, os: TargetOs) -> String {
    let stem = package.replace('-', "_");
    match os {
        TargetOs::Windows => format!("{stem}.dll"),
        TargetOs::Linux => format!("lib{stem}.so"),
        TargetOs::MacOs => format!("lib{stem}.dylib"),
    }
}

/// `hello_vst` -> `HelloVst`. Used when no bundle name is configured.
pub fn default_bundle_name(package: &str) -> String {
    package
        .split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect()
}

fn check_name(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidName {
        field,
        value: value.to_string(),
        reason,
    };

    if value.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value.contains(['/', '\\']) {
        return Err(invalid("must not contain path separators"));
    }
    if value == "." || value == ".." {
        return Err(invalid("must not be a relative directory"));
    }
    Ok(())
}
