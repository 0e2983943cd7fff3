use std::ffi::OsStr;
use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::path::PathBuf;

use camino::Utf8Path;

use crate::error::LaunchError;

/// File name of the script run by the launcher.
pub const SCRIPT_NAME: &str = "celerymon.sh";

/// Script run by the fixed-path launcher.
pub const FIXED_SCRIPT_PATH: &str = "/tmp/celerymon.sh";

/// Location of the script to hand the process over to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPath(PathBuf);

impl TargetPath {
    /// Append [`SCRIPT_NAME`] to `dir`, byte for byte.
    ///
    /// No separator is inserted: `"/opt/tools"` yields `"/opt/toolscelerymon.sh"`.
    pub fn in_directory(dir: &OsStr) -> Self {
        let mut path = OsString::with_capacity(dir.len() + SCRIPT_NAME.len());
        path.push(dir);
        path.push(SCRIPT_NAME);
        TargetPath(path.into())
    }

    pub fn fixed() -> Self {
        TargetPath(FIXED_SCRIPT_PATH.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolve the target and check it stays inside `trusted_dir`.
    ///
    /// Both paths are canonicalized, so symlinks pointing out of the trusted directory are
    /// rejected. The returned target is the resolved one, which is what must be executed.
    pub fn confine_to(&self, trusted_dir: &Utf8Path) -> Result<TargetPath, LaunchError> {
        let trusted =
            trusted_dir
                .canonicalize()
                .map_err(|source| LaunchError::TargetResolution {
                    path: trusted_dir.as_std_path().to_path_buf(),
                    source,
                })?;
        let resolved = self
            .0
            .canonicalize()
            .map_err(|source| LaunchError::TargetResolution {
                path: self.0.clone(),
                source,
            })?;

        if resolved.starts_with(&trusted) && resolved != trusted {
            Ok(TargetPath(resolved))
        } else {
            Err(LaunchError::UntrustedTarget {
                resolved,
                trusted_dir: trusted,
            })
        }
    }
}

pub fn has_trailing_separator(dir: &OsStr) -> bool {
    dir.as_bytes().last() == Some(&b'/')
}
