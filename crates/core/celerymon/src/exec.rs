use std::convert::Infallible;
use std::ffi::CString;
use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::errno::Errno;

use crate::target::TargetPath;
use crate::target::SCRIPT_NAME;

/// The program image and argument vector the launcher hands the process over to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    target: TargetPath,
    args: Vec<OsString>,
}

impl ScriptInvocation {
    /// `argv[0]` is always [`SCRIPT_NAME`], followed by the worker prefix if any.
    pub fn new(target: TargetPath, worker_prefix: Option<OsString>) -> Self {
        let mut args = Vec::with_capacity(2);
        args.push(OsString::from(SCRIPT_NAME));
        args.extend(worker_prefix);
        ScriptInvocation { target, args }
    }

    pub fn program(&self) -> &Path {
        self.target.as_path()
    }

    /// The full argument vector, `argv[0]` included.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// Replaces the image of the running process.
pub trait ProcessImage {
    /// Only returns when the replacement failed.
    fn replace(&self, invocation: &ScriptInvocation) -> Result<Infallible, Errno>;
}

/// `execv(2)`: the environment and open file descriptors are inherited.
pub struct Execv;

impl ProcessImage for Execv {
    fn replace(&self, invocation: &ScriptInvocation) -> Result<Infallible, Errno> {
        let program = to_cstring(invocation.program().as_os_str().as_bytes())?;
        let argv = invocation
            .args()
            .iter()
            .map(|arg| to_cstring(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;

        nix::unistd::execv(&program, &argv)
    }
}

// Strings coming from argv can't hold a NUL byte, but a config file could.
fn to_cstring(bytes: &[u8]) -> Result<CString, Errno> {
    CString::new(bytes).map_err(|_| Errno::EINVAL)
}
