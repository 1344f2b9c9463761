//! The seam between the pipeline and external programs.
//!
//! Stages describe what to run as an [`Invocation`] and hand it to a
//! [`CommandRunner`]. [`SystemRunner`] spawns real processes; tests swap in a
//! recording fake.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use crate::toolchain::ToolchainEnv;

/// One external process: program, arguments, working directory, and the
/// scoped toolchain environment it runs under.
#[derive(Clone, Debug, Default)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: ToolchainEnv,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, env: &ToolchainEnv) -> Self {
        self.env = env.clone();
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        self.env.apply_to_command(&mut cmd);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit status of a finished process. `code` is `None` when the process was
/// killed by a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exit {
    pub code: Option<i32>,
}

impl Exit {
    pub const SUCCESS: Exit = Exit { code: Some(0) };

    pub fn code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for Exit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("termination by signal"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Captured {
    pub exit: Exit,
    pub stdout: String,
}

pub trait CommandRunner {
    /// Run to completion with inherited stdio.
    fn status(&self, invocation: &Invocation) -> io::Result<Exit>;

    /// Run to completion, capturing stdout. Stderr stays attached to ours.
    fn capture(&self, invocation: &Invocation) -> io::Result<Captured>;

    /// Resolve `program` against `search_path` (a `PATH`-style list).
    fn locate(&self, program: &OsStr, search_path: &OsStr) -> Option<PathBuf>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn status(&self, invocation: &Invocation) -> io::Result<Exit> {
        let status = invocation.to_command().stdin(Stdio::null()).status()?;
        Ok(status.into())
    }

    fn capture(&self, invocation: &Invocation) -> io::Result<Captured> {
        let out = invocation
            .to_command()
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()?;
        Ok(Captured {
            exit: out.status.into(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
        })
    }

    fn locate(&self, program: &OsStr, search_path: &OsStr) -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        which::which_in(program, Some(search_path), cwd).ok()
    }
}
