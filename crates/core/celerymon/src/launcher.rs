use std::convert::Infallible;
use std::ffi::OsString;

use nix::unistd::Uid;
use tracing::debug;
use tracing::warn;

use crate::config::LauncherConfig;
use crate::config::PrivilegePolicy;
use crate::error::LaunchError;
use crate::exec::Execv;
use crate::exec::ProcessImage;
use crate::exec::ScriptInvocation;
use crate::privilege::Identity;
use crate::privilege::ProcessIdentity;
use crate::target::has_trailing_separator;
use crate::target::TargetPath;

/// Script to launch, as requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchRequest {
    /// `celerymon.sh` in the given directory, with an optional worker prefix.
    InDirectory {
        script_dir: OsString,
        worker_prefix: Option<OsString>,
    },
    /// The script at [`crate::target::FIXED_SCRIPT_PATH`], without arguments.
    Fixed,
}

/// Hands the process over to `celerymon.sh` as root.
pub struct Launcher<I = ProcessIdentity, P = Execv> {
    config: LauncherConfig,
    identity: I,
    image: P,
}

impl Launcher {
    pub fn new(config: LauncherConfig) -> Self {
        Launcher::with_system(config, ProcessIdentity, Execv)
    }
}

impl<I: Identity, P: ProcessImage> Launcher<I, P> {
    pub fn with_system(config: LauncherConfig, identity: I, image: P) -> Self {
        Launcher {
            config,
            identity,
            image,
        }
    }

    /// Replace the running process with the requested script.
    ///
    /// Never returns on success.
    pub fn launch(&self, request: LaunchRequest) -> Result<Infallible, LaunchError> {
        let (target, worker_prefix) = self.target(request)?;

        self.assert_root()?;

        let target = match &self.config.trusted_dir {
            Some(trusted_dir) => target.confine_to(trusted_dir)?,
            None => target,
        };

        let invocation = ScriptInvocation::new(target, worker_prefix);
        debug!(
            program = ?invocation.program(),
            args = ?invocation.args(),
            "Replacing process image"
        );

        match self.image.replace(&invocation) {
            Ok(never) => match never {},
            Err(errno) => Err(LaunchError::Exec {
                path: invocation.program().to_path_buf(),
                errno,
            }),
        }
    }

    fn target(
        &self,
        request: LaunchRequest,
    ) -> Result<(TargetPath, Option<OsString>), LaunchError> {
        match request {
            LaunchRequest::InDirectory {
                script_dir,
                worker_prefix,
            } => {
                if !has_trailing_separator(&script_dir) {
                    if self.config.require_trailing_separator {
                        return Err(LaunchError::MissingSeparator {
                            dir: script_dir.into(),
                        });
                    }
                    warn!(
                        ?script_dir,
                        "Script directory doesn't end with '/', the file name is appended as is"
                    );
                }
                Ok((TargetPath::in_directory(&script_dir), worker_prefix))
            }
            LaunchRequest::Fixed => Ok((TargetPath::fixed(), None)),
        }
    }

    fn assert_root(&self) -> Result<(), LaunchError> {
        match self.identity.become_root() {
            Ok(()) => {
                debug!("Running as root");
                Ok(())
            }
            Err(errno) => match self.config.on_privilege_failure {
                PrivilegePolicy::Warn => {
                    let uid = self.identity.effective_uid();
                    warn!(
                        %errno,
                        user = %user_name(uid),
                        uid = uid.as_raw(),
                        "Failed to assume root privileges, running the script with the current identity"
                    );
                    Ok(())
                }
                PrivilegePolicy::FailClosed => Err(LaunchError::PrivilegeAssertion { errno }),
            },
        }
    }
}

fn user_name(uid: Uid) -> String {
    uzers::get_user_by_uid(uid.as_raw())
        .map(|user| user.name().to_string_lossy().into_owned())
        .unwrap_or_default()
}
