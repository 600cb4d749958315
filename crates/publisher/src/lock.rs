//! Non-blocking advisory file locks (`flock(2)`)

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;

use tracing::trace;

/// Lock flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Any number of readers
    Shared,
    /// A single writer, no readers
    Exclusive,
}

impl LockMode {
    fn operation(self) -> libc::c_int {
        match self {
            LockMode::Shared => libc::LOCK_SH,
            LockMode::Exclusive => libc::LOCK_EX,
        }
    }
}

/// Entry point for taking advisory locks
pub struct AdvisoryLock;

impl AdvisoryLock {
    /// Try to lock `file` without blocking.
    ///
    /// Returns `Ok(None)` when another open file description holds a
    /// conflicting lock. Locks are advisory: only cooperating processes see
    /// them.
    pub fn try_acquire(file: &File, mode: LockMode) -> io::Result<Option<LockGuard<'_>>> {
        let fd = file.as_raw_fd();
        loop {
            // SAFETY: `fd` is borrowed from `file`, which stays open for at
            // least as long as the returned guard borrows it.
            let ret = unsafe { libc::flock(fd, mode.operation() | libc::LOCK_NB) };
            if ret == 0 {
                return Ok(Some(LockGuard { file, mode }));
            }

            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(code) if is_contention(code) => return Ok(None),
                Some(libc::EINTR) => continue,
                _ => return Err(err),
            }
        }
    }
}

fn is_contention(code: i32) -> bool {
    code == libc::EWOULDBLOCK || code == libc::EAGAIN || code == libc::EACCES
}

/// Held lock, released on drop
#[derive(Debug)]
pub struct LockGuard<'a> {
    file: &'a File,
    mode: LockMode,
}

impl LockGuard<'_> {
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// The locked file
    pub fn file(&self) -> &File {
        self.file
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: the guard borrows a live `&File`, so the descriptor is
        // still open here.
        let ret = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        if ret != 0 {
            trace!(error = %io::Error::last_os_error(), "flock unlock failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn two_handles() -> (NamedTempFile, File, File) {
        let tmp = NamedTempFile::new().unwrap();
        let a = File::open(tmp.path()).unwrap();
        let b = File::open(tmp.path()).unwrap();
        (tmp, a, b)
    }

    #[test]
    fn test_shared_locks_coexist() {
        let (_tmp, a, b) = two_handles();
        let ga = AdvisoryLock::try_acquire(&a, LockMode::Shared).unwrap();
        let gb = AdvisoryLock::try_acquire(&b, LockMode::Shared).unwrap();
        assert!(ga.is_some());
        assert!(gb.is_some());
    }

    #[test]
    fn test_shared_blocks_exclusive_without_waiting() {
        let (_tmp, reader, writer) = two_handles();
        let shared = AdvisoryLock::try_acquire(&reader, LockMode::Shared)
            .unwrap()
            .unwrap();

        assert!(AdvisoryLock::try_acquire(&writer, LockMode::Exclusive)
            .unwrap()
            .is_none());

        drop(shared);
        let exclusive = AdvisoryLock::try_acquire(&writer, LockMode::Exclusive).unwrap();
        assert_eq!(exclusive.map(|g| g.mode()), Some(LockMode::Exclusive));
    }

    #[test]
    fn test_exclusive_blocks_shared() {
        let (_tmp, writer, reader) = two_handles();
        let _exclusive = AdvisoryLock::try_acquire(&writer, LockMode::Exclusive)
            .unwrap()
            .unwrap();

        assert!(AdvisoryLock::try_acquire(&reader, LockMode::Shared)
            .unwrap()
            .is_none());
    }
}
