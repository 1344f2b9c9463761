//! Compilation targets: the triple, the cargo profile, and the VST3
//! platform directory a triple maps to.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The only OS/arch pair the hand-written build scripts ever targeted.
pub const DEFAULT_TRIPLE: &str = "x86_64-pc-windows-msvc";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Release,
    Debug,
}

impl Profile {
    /// Sub-directory cargo writes this profile's artifacts to.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Debug => "debug",
        }
    }

    pub fn cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Release => Some("--release"),
            Self::Debug => None,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetOs {
    Windows,
    Linux,
    MacOs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetArch {
    X86_64,
    Aarch64,
    X86,
}

/// A target triple plus build profile, validated on construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTarget {
    triple: String,
    profile: Profile,
    os: TargetOs,
    arch: TargetArch,
}

impl BuildTarget {
    pub fn new(triple: impl Into<String>, profile: Profile) -> Result<Self, ConfigError> {
        let triple = triple.into();
        let (os, arch) = classify(&triple)?;
        Ok(Self {
            triple,
            profile,
            os,
            arch,
        })
    }

    pub fn triple(&self) -> &str {
        &self.triple
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn os(&self) -> TargetOs {
        self.os
    }

    pub fn arch(&self) -> TargetArch {
        self.arch
    }

    /// Directory name under `<bundle>.vst3/Contents/` for this target.
    pub fn platform_dir(&self) -> &'static str {
        match (self.os, self.arch) {
            (TargetOs::Windows, TargetArch::X86_64) => "x86_64-win",
            (TargetOs::Windows, TargetArch::Aarch64) => "arm64-win",
            (TargetOs::Windows, TargetArch::X86) => "x86-win",
            (TargetOs::Linux, TargetArch::X86_64) => "x86_64-linux",
            (TargetOs::Linux, TargetArch::Aarch64) => "aarch64-linux",
            (TargetOs::Linux, TargetArch::X86) => "i386-linux",
            (TargetOs::MacOs, _) => "MacOS",
        }
    }

    /// `<source-root>/target/<triple>/<profile>`
    pub fn output_dir(&self, source_root: &Path) -> PathBuf {
        source_root
            .join("target")
            .join(&self.triple)
            .join(self.profile.dir_name())
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.triple, self.profile)
    }
}

fn classify(triple: &str) -> Result<(TargetOs, TargetArch), ConfigError> {
    let unsupported = || ConfigError::UnsupportedTarget(triple.to_string());

    let mut parts = triple.split('-');
    let arch = match parts.next().unwrap_or_default() {
        "x86_64" => TargetArch::X86_64,
        "aarch64" => TargetArch::Aarch64,
        "i386" | "i586" | "i686" => TargetArch::X86,
        _ => return Err(unsupported()),
    };

    let rest: Vec<&str> = parts.collect();
    let os = if rest.contains(&"windows") {
        TargetOs::Windows
    } else if rest.contains(&"linux") {
        TargetOs::Linux
    } else if rest.contains(&"darwin") {
        TargetOs::MacOs
    } else {
        return Err(unsupported());
    };

    Ok((os, arch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_platform_dir() {
        let t = BuildTarget::new("x86_64-pc-windows-msvc", Profile::Release).unwrap();
        assert_eq!(t.os(), TargetOs::Windows);
        assert_eq!(t.platform_dir(), "x86_64-win");
    }

    #[test]
    fn test_other_platform_dirs() {
        let dir = |triple: &str| {
            BuildTarget::new(triple, Profile::Release)
                .unwrap()
                .platform_dir()
        };
        assert_eq!(dir("aarch64-pc-windows-msvc"), "arm64-win");
        assert_eq!(dir("i686-pc-windows-gnu"), "x86-win");
        assert_eq!(dir("x86_64-unknown-linux-gnu"), "x86_64-linux");
        assert_eq!(dir("aarch64-unknown-linux-gnu"), "aarch64-linux");
        assert_eq!(dir("aarch64-apple-darwin"), "MacOS");
    }

    #[test]
    fn test_unsupported_triples() {
        for triple in [
            "wasm32-unknown-unknown",
            "x86_64-unknown-none",
            "",
            "riscv64gc-unknown-linux-gnu",
        ] {
            let err = BuildTarget::new(triple, Profile::Release).unwrap_err();
            assert!(matches!(err, ConfigError::UnsupportedTarget(t) if t == triple));
        }
    }

    #[test]
    fn test_output_dir() {
        let t = BuildTarget::new(DEFAULT_TRIPLE, Profile::Release).unwrap();
        assert_eq!(
            t.output_dir(Path::new("/src/hello_vst")),
            Path::new("/src/hello_vst/target/x86_64-pc-windows-msvc/release")
        );

        let t = BuildTarget::new(DEFAULT_TRIPLE, Profile::Debug).unwrap();
        assert!(t.output_dir(Path::new("p")).ends_with("debug"));
    }

    #[test]
    fn test_profile_flags() {
        assert_eq!(Profile::Release.cargo_flag(), Some("--release"));
        assert_eq!(Profile::Debug.cargo_flag(), None);
        assert_eq!(Profile::default(), Profile::Release);
    }
}
