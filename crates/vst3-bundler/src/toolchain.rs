//! Environment preparation.
//!
//! Nothing here touches the process environment. The cargo bin directory and
//! whatever the compiler-environment script exports are collected into a
//! [`ToolchainEnv`] that is applied to each child command, so repeated runs in
//! one process never accumulate state.

use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::process::{CommandRunner, Invocation};

/// Printed between the script's own output and the environment dump.
const ENV_SENTINEL: &str = "__VST3_BUNDLER_ENV__";

/// `set` prints one variable per line; `env -0` ends each one with NUL so
/// values may contain newlines.
const RECORD_END: char = if cfg!(windows) { '\n' } else { '\0' };

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Program used for `build` and, by default, the packaging helper.
    /// A bare name looked up on PATH, or an absolute path.
    pub cargo: String,
    /// Prepended to PATH when `cargo` is not already reachable.
    /// Defaults to `$CARGO_HOME/bin`, then `~/.cargo/bin`.
    pub cargo_bin_dir: Option<PathBuf>,
    /// Compiler-environment initializer, e.g. `vcvars64.bat`.
    pub env_script: Option<PathBuf>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            cargo: "cargo".to_string(),
            cargo_bin_dir: None,
            env_script: None,
        }
    }
}

impl ToolchainConfig {
    pub fn cargo_bin_dir(&self) -> Option<PathBuf> {
        self.cargo_bin_dir.clone().or_else(default_cargo_bin_dir)
    }
}

pub fn default_cargo_bin_dir() -> Option<PathBuf> {
    env::var_os("CARGO_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".cargo")))
        .map(|cargo_home| cargo_home.join("bin"))
}

/// Scoped environment overrides for child processes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolchainEnv {
    path_prefix: Vec<PathBuf>,
    vars: BTreeMap<String, String>,
}

impl ToolchainEnv {
    pub fn is_empty(&self) -> bool {
        self.path_prefix.is_empty() && self.vars.is_empty()
    }

    pub fn path_prefix(&self) -> &[PathBuf] {
        &self.path_prefix
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn prepend_path(&mut self, dir: impl Into<PathBuf>) {
        self.path_prefix.insert(0, dir.into());
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    fn path_override(&self) -> Option<&str> {
        self.vars
            .iter()
            .find(|(key, _)| is_path_key(key))
            .map(|(_, value)| value.as_str())
    }

    /// PATH a child would see: a script-provided PATH wins, otherwise the
    /// prefix goes in front of the inherited PATH.
    pub fn search_path(&self) -> OsString {
        if let Some(path) = self.path_override() {
            return OsString::from(path);
        }
        let inherited = env::var_os("PATH").unwrap_or_default();
        let mut paths = self.path_prefix.clone();
        paths.extend(env::split_paths(&inherited));
        env::join_paths(paths).unwrap_or(inherited)
    }

    pub fn apply_to_command(&self, cmd: &mut Command) {
        for (key, value) in self.vars.iter().filter(|(key, _)| !is_path_key(key)) {
            cmd.env(key, value);
        }
        if !self.path_prefix.is_empty() || self.path_override().is_some() {
            cmd.env("PATH", self.search_path());
        }
    }

    /// Shell exports a user can `eval` to get the same environment.
    pub fn render_exports(&self, shell: Shell) -> String {
        let mut out = String::new();
        let path_entries: Vec<String> = self
            .path_prefix
            .iter()
            .map(|p| p.display().to_string())
            .collect();

        match shell {
            Shell::Bash | Shell::Sh => {
                if let Some(path) = self.path_override() {
                    out.push_str(&format!("export PATH=\"{}\"\n", sh_escape(path)));
                } else if !path_entries.is_empty() {
                    let joined = path_entries
                        .iter()
                        .map(|p| sh_escape(p))
                        .collect::<Vec<_>>()
                        .join(":");
                    out.push_str(&format!("export PATH=\"{joined}:$PATH\"\n"));
                }
                for (key, value) in self.vars.iter().filter(|(key, _)| !is_path_key(key)) {
                    out.push_str(&format!("export {key}=\"{}\"\n", sh_escape(value)));
                }
            }
            Shell::Cmd => {
                if let Some(path) = self.path_override() {
                    out.push_str(&format!("set \"PATH={path}\"\n"));
                } else if !path_entries.is_empty() {
                    out.push_str(&format!("set \"PATH={};%PATH%\"\n", path_entries.join(";")));
                }
                for (key, value) in self.vars.iter().filter(|(key, _)| !is_path_key(key)) {
                    out.push_str(&format!("set \"{key}={value}\"\n"));
                }
            }
        }
        out
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    #[default]
    Bash,
    Sh,
    Cmd,
}

/// Make cargo reachable and collect the compiler environment.
///
/// Fails with `ToolchainMissing` when cargo cannot be found even after the
/// bin directory is prepended, or when the env script is missing or exits
/// non-zero.
pub fn prepare(
    config: &ToolchainConfig,
    runner: &dyn CommandRunner,
) -> Result<ToolchainEnv, PipelineError> {
    let mut env = ToolchainEnv::default();
    let cargo = OsStr::new(&config.cargo);

    if runner.locate(cargo, &env.search_path()).is_none() {
        let bin_dir = config.cargo_bin_dir();
        if let Some(dir) = &bin_dir {
            debug!(dir = %dir.display(), "cargo not on PATH, prepending bin dir");
            env.prepend_path(dir);
        }
        if runner.locate(cargo, &env.search_path()).is_none() {
            let looked_in = bin_dir
                .map(|d| format!(" (also looked in {})", d.display()))
                .unwrap_or_default();
            return Err(PipelineError::ToolchainMissing {
                reason: format!("`{}` is not on PATH{looked_in}", config.cargo),
            });
        }
    }

    if let Some(script) = &config.env_script {
        let vars = run_env_script(script, &env, runner)?;
        info!(script = %script.display(), vars = vars.len(), "compiler environment loaded");
        for (key, value) in vars {
            env.set_var(key, value);
        }
    }

    Ok(env)
}

fn run_env_script(
    script: &Path,
    scoped: &ToolchainEnv,
    runner: &dyn CommandRunner,
) -> Result<BTreeMap<String, String>, PipelineError> {
    let missing = |reason: String| PipelineError::ToolchainMissing { reason };

    if !script.is_file() {
        return Err(missing(format!(
            "compiler environment script {} does not exist",
            script.display()
        )));
    }

    let invocation = env_dump_invocation(script).env(scoped);
    debug!(command = %invocation, "running compiler environment script");
    let captured = runner
        .capture(&invocation)
        .map_err(|e| missing(format!("could not run {}: {e}", script.display())))?;
    if !captured.exit.success() {
        return Err(missing(format!(
            "{} failed with {}",
            script.display(),
            captured.exit
        )));
    }

    let dumped = parse_env_dump(&captured.stdout, RECORD_END);
    Ok(dumped
        .into_iter()
        .filter(|(key, _)| !SHELL_BOOKKEEPING.contains(&key.as_str()))
        .filter(|(key, value)| env::var(key).ok().as_deref() != Some(value.as_str()))
        .collect())
}

/// Variables the dumping shell sets on its own.
const SHELL_BOOKKEEPING: &[&str] = &["_", "PWD", "OLDPWD", "SHLVL"];

fn env_dump_invocation(script: &Path) -> Invocation {
    if cfg!(windows) {
        Invocation::new("cmd")
            .args(["/d", "/c", "call"])
            .arg(script)
            .args([">nul", "&&", "echo", ENV_SENTINEL, "&&", "set"])
    } else {
        Invocation::new("sh")
            .arg("-c")
            .arg(format!(". \"$1\" >&2 && echo {ENV_SENTINEL} && env -0"))
            .arg("sh")
            .arg(script)
    }
}

/// Parse `KEY=VALUE` records ending in `record_end` after the sentinel line.
/// Anything the script printed before it is ignored.
fn parse_env_dump(stdout: &str, record_end: char) -> BTreeMap<String, String> {
    let Some(dump) = after_sentinel(stdout) else {
        return BTreeMap::new();
    };
    dump.split(record_end)
        .map(|record| {
            if record_end == '\n' {
                record.trim_end_matches('\r')
            } else {
                record
            }
        })
        .filter_map(|record| record.split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn after_sentinel(stdout: &str) -> Option<&str> {
    let mut offset = 0;
    for line in stdout.split_inclusive('\n') {
        offset += line.len();
        if line.trim() == ENV_SENTINEL {
            return Some(&stdout[offset..]);
        }
    }
    None
}

fn is_path_key(key: &str) -> bool {
    if cfg!(windows) {
        key.eq_ignore_ascii_case("PATH")
    } else {
        key == "PATH"
    }
}

fn sh_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Captured, Exit};
    use crate::testutil::FakeRunner;

    #[test]
    fn test_parse_set_dump_skips_script_output() {
        let dump = format!(
            "** Visual Studio 2022 Developer Command Prompt\n{ENV_SENTINEL} \r\n\
             INCLUDE=C:\\VC\\include\r\nLIB=C:\\VC\\lib\nnot a var\n=C:=C:\\\n"
        );
        let vars = parse_env_dump(&dump, '\n');
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["INCLUDE"], "C:\\VC\\include");
        assert_eq!(vars["LIB"], "C:\\VC\\lib");
    }

    #[test]
    fn test_parse_nul_dump_keeps_newlines_in_values() {
        let dump = format!("setting up\n{ENV_SENTINEL}\nMULTI=line one\nline two=oops\0B=x=y\0");
        let vars = parse_env_dump(&dump, '\0');
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["MULTI"], "line one\nline two=oops");
        assert_eq!(vars["B"], "x=y");
    }

    #[test]
    fn test_parse_env_dump_without_sentinel_is_empty() {
        assert!(parse_env_dump("A=1\nB=2\n", '\n').is_empty());
        assert!(parse_env_dump("A=1\0B=2\0", '\0').is_empty());
    }

    #[test]
    fn test_prepare_cargo_on_path() {
        let runner = FakeRunner::new();
        let env = prepare(&ToolchainConfig::default(), &runner).unwrap();
        assert!(env.is_empty());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_prepare_prepends_bin_dir() {
        let bin = PathBuf::from("/opt/rust/cargo/bin");
        let runner = FakeRunner::new().with_cargo_only_in(&bin);
        let config = ToolchainConfig {
            cargo_bin_dir: Some(bin.clone()),
            ..ToolchainConfig::default()
        };

        let env = prepare(&config, &runner).unwrap();
        assert_eq!(env.path_prefix(), [bin.clone()]);
        assert_eq!(env::split_paths(&env.search_path()).next(), Some(bin));
    }

    #[test]
    fn test_prepare_cargo_missing_everywhere() {
        let runner = FakeRunner::new().with_cargo_only_in("/nowhere/else");
        let config = ToolchainConfig {
            cargo_bin_dir: Some(PathBuf::from("/opt/empty/bin")),
            ..ToolchainConfig::default()
        };

        let err = prepare(&config, &runner).unwrap_err();
        assert!(matches!(err, PipelineError::ToolchainMissing { .. }));
        assert!(err.to_string().contains("/opt/empty/bin"));
    }

    #[test]
    fn test_prepare_missing_script() {
        let config = ToolchainConfig {
            env_script: Some(PathBuf::from("/no/such/vcvars64.bat")),
            ..ToolchainConfig::default()
        };
        let runner = FakeRunner::new();
        let err = prepare(&config, &runner).unwrap_err();
        assert!(matches!(err, PipelineError::ToolchainMissing { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_prepare_script_failure_is_toolchain_missing() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("vcvars64.bat");
        std::fs::write(&script, "exit 1\n").unwrap();

        let runner = FakeRunner::new().with_capture(|_| {
            Ok(Captured {
                exit: Exit::code(1),
                stdout: String::new(),
            })
        });
        let config = ToolchainConfig {
            env_script: Some(script),
            ..ToolchainConfig::default()
        };

        let err = prepare(&config, &runner).unwrap_err();
        assert!(matches!(err, PipelineError::ToolchainMissing { .. }));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_prepare_script_vars_are_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("env.sh");
        std::fs::write(&script, "export VST3_BUNDLER_TEST_VAR=yes\n").unwrap();

        let runner = FakeRunner::new().with_capture(|_| {
            Ok(Captured {
                exit: Exit::SUCCESS,
                stdout: format!("{ENV_SENTINEL}\nVST3_BUNDLER_TEST_VAR=yes{RECORD_END}"),
            })
        });
        let config = ToolchainConfig {
            env_script: Some(script),
            ..ToolchainConfig::default()
        };

        let env = prepare(&config, &runner).unwrap();
        assert_eq!(env.vars()["VST3_BUNDLER_TEST_VAR"], "yes");
        assert!(std::env::var_os("VST3_BUNDLER_TEST_VAR").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_env_script_through_real_shell() {
        use crate::process::SystemRunner;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("env.sh");
        std::fs::write(
            &script,
            "echo 'setting up' \nexport VST3_BUNDLER_SHELL_VAR=from-script\n",
        )
        .unwrap();

        let vars = run_env_script(&script, &ToolchainEnv::default(), &SystemRunner).unwrap();
        assert_eq!(vars["VST3_BUNDLER_SHELL_VAR"], "from-script");
        if std::env::var_os("HOME").is_some() {
            assert!(!vars.contains_key("HOME"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_multiline_values_survive_the_dump() {
        use crate::process::SystemRunner;

        let inherited = "line one\nline two=oops";
        env::set_var("VST3_BUNDLER_MULTILINE_INHERITED", inherited);

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("env.sh");
        std::fs::write(&script, "export VST3_BUNDLER_MULTILINE_SET='first\nsecond=2'\n").unwrap();

        let vars = run_env_script(&script, &ToolchainEnv::default(), &SystemRunner).unwrap();
        assert_eq!(vars["VST3_BUNDLER_MULTILINE_SET"], "first\nsecond=2");
        assert!(!vars.contains_key("VST3_BUNDLER_MULTILINE_INHERITED"));
        assert!(!vars.contains_key("line two"));
        assert!(!vars.contains_key("second"));

        let mut scoped = ToolchainEnv::default();
        for (key, value) in vars {
            scoped.set_var(key, value);
        }
        let mut child = Command::new("sh");
        child
            .arg("-c")
            .arg("printf '%s' \"$VST3_BUNDLER_MULTILINE_INHERITED\"");
        scoped.apply_to_command(&mut child);
        let out = child.output().unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout), inherited);
    }

    #[test]
    fn test_render_exports_sh() {
        let mut env = ToolchainEnv::default();
        env.prepend_path("/home/dev/.cargo/bin");
        env.set_var("LIB", "C:\\VC\\lib");
        env.set_var("QUOTED", "a\"b$c");

        let out = env.render_exports(Shell::Bash);
        assert!(out.contains("export PATH=\"/home/dev/.cargo/bin:$PATH\"\n"));
        assert!(out.contains("export LIB=\"C:\\\\VC\\\\lib\"\n"));
        assert!(out.contains("export QUOTED=\"a\\\"b\\$c\"\n"));
    }

    #[test]
    fn test_render_exports_cmd() {
        let mut env = ToolchainEnv::default();
        env.prepend_path("C:\\Users\\dev\\.cargo\\bin");
        env.set_var("INCLUDE", "C:\\VC\\include");

        let out = env.render_exports(Shell::Cmd);
        assert!(out.contains("set \"PATH=C:\\Users\\dev\\.cargo\\bin;%PATH%\"\n"));
        assert!(out.contains("set \"INCLUDE=C:\\VC\\include\"\n"));
    }

    #[test]
    fn test_script_path_overrides_prefix() {
        let mut env = ToolchainEnv::default();
        env.prepend_path("/prefix");
        env.set_var("PATH", "/from/script");
        assert_eq!(env.search_path(), OsString::from("/from/script"));
        assert!(env.render_exports(Shell::Sh).starts_with("export PATH=\"/from/script\""));
    }
}
