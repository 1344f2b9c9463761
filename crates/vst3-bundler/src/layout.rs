//! On-disk paths for one plugin build: where cargo leaves the binary and
//! where the VST3 bundle goes.

use std::path::{Path, PathBuf};

use crate::descriptor::PluginDescriptor;
use crate::target::BuildTarget;

/// ```text
/// <source-root>/target/bundled/<bundle>.vst3/Contents/<platform-dir>/<bundle-binary>
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleLayout {
    pub compiled_binary: PathBuf,
    pub bundled_root: PathBuf,
    pub bundle_dir: PathBuf,
    pub contents_dir: PathBuf,
    pub platform_dir: PathBuf,
    pub binary_path: PathBuf,
}

impl BundleLayout {
    pub fn new(source_root: &Path, plugin: &PluginDescriptor, target: &BuildTarget) -> Self {
        let compiled_binary = target.output_dir(source_root).join(&plugin.binary_name);
        let bundled_root = source_root.join("target").join("bundled");
        let bundle_dir = bundled_root.join(plugin.bundle_dir_name());
        let contents_dir = bundle_dir.join("Contents");
        let platform_dir = contents_dir.join(target.platform_dir());
        let binary_path = platform_dir.join(plugin.bundle_binary_name(target.os()));

        Self {
            compiled_binary,
            bundled_root,
            bundle_dir,
            contents_dir,
            platform_dir,
            binary_path,
        }
    }

    /// Every directory of the bundle, outermost first.
    pub fn directories(&self) -> [&Path; 4] {
        [
            &self.bundled_root,
            &self.bundle_dir,
            &self.contents_dir,
            &self.platform_dir,
        ]
    }
}
