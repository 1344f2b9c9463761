//! Test doubles for the process seam.

use std::cell::RefCell;
use std::env;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use crate::descriptor::PluginDescriptor;
use crate::pipeline::PipelineConfig;
use crate::process::{Captured, CommandRunner, Exit, Invocation};
use crate::stages::PackagingConfig;
use crate::target::{BuildTarget, Profile, DEFAULT_TRIPLE};
use crate::toolchain::ToolchainConfig;

type StatusFn = Box<dyn Fn(&Invocation) -> io::Result<Exit>>;
type CaptureFn = Box<dyn Fn(&Invocation) -> io::Result<Captured>>;

/// Records every invocation and answers with scripted results.
///
/// By default every program succeeds and every program is locatable.
pub struct FakeRunner {
    calls: RefCell<Vec<Invocation>>,
    on_status: StatusFn,
    on_capture: CaptureFn,
    cargo_dir: Option<PathBuf>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            on_status: Box::new(|_| Ok(Exit::SUCCESS)),
            on_capture: Box::new(|_| {
                Ok(Captured {
                    exit: Exit::SUCCESS,
                    stdout: String::new(),
                })
            }),
            cargo_dir: None,
        }
    }

    pub fn with_status(mut self, f: impl Fn(&Invocation) -> io::Result<Exit> + 'static) -> Self {
        self.on_status = Box::new(f);
        self
    }

    pub fn with_capture(
        mut self,
        f: impl Fn(&Invocation) -> io::Result<Captured> + 'static,
    ) -> Self {
        self.on_capture = Box::new(f);
        self
    }

    /// Programs are only found when `dir` is part of the search path.
    pub fn with_cargo_only_in(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cargo_dir = Some(dir.into());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Number of recorded invocations carrying `arg`.
    pub fn count_with_arg(&self, arg: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.has_arg(arg)).count()
    }
}

impl CommandRunner for FakeRunner {
    fn status(&self, invocation: &Invocation) -> io::Result<Exit> {
        self.calls.borrow_mut().push(invocation.clone());
        (self.on_status)(invocation)
    }

    fn capture(&self, invocation: &Invocation) -> io::Result<Captured> {
        self.calls.borrow_mut().push(invocation.clone());
        (self.on_capture)(invocation)
    }

    fn locate(&self, program: &OsStr, search_path: &OsStr) -> Option<PathBuf> {
        match &self.cargo_dir {
            None => Some(PathBuf::from(program)),
            Some(dir) => env::split_paths(search_path)
                .any(|p| &p == dir)
                .then(|| dir.join(program)),
        }
    }
}

/// The `hello_vst` plugin from the original build scripts, rooted at `root`.
pub fn hello_config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        plugin: PluginDescriptor {
            plugin_name: "hello_vst".to_string(),
            binary_name: "hello_vst.dll".to_string(),
            bundle_name: "HelloVst".to_string(),
        },
        target: BuildTarget::new(DEFAULT_TRIPLE, Profile::Release).unwrap(),
        source_root: root.to_path_buf(),
        toolchain: ToolchainConfig::default(),
        packaging: PackagingConfig::default(),
    }
}
