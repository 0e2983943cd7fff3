use nix::errno::Errno;
use nix::unistd::Uid;

/// The user identity of the running process.
pub trait Identity {
    /// Request uid 0, relying on the set-user-ID bit of the executable.
    fn become_root(&self) -> Result<(), Errno>;

    fn effective_uid(&self) -> Uid;
}

pub struct ProcessIdentity;

impl Identity for ProcessIdentity {
    fn become_root(&self) -> Result<(), Errno> {
        nix::unistd::setuid(Uid::from_raw(0))
    }

    fn effective_uid(&self) -> Uid {
        Uid::effective()
    }
}
