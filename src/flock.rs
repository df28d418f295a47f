//! Exclusive advisory lock on the data file
//!
//! Keeps a second process (or a second `Database` in this process) from
//! opening the same file. The lock is released when the `FileLock` drops.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Pause between lock attempts while waiting
const RETRY_INTERVAL: Duration = Duration::from_millis(20);

pub struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    /// Lock `path` exclusively, creating the file if needed.
    ///
    /// Retries until `timeout` elapses, then returns `WouldBlock`. The file
    /// content is left untouched.
    pub fn acquire<P: AsRef<Path>>(path: P, timeout: Duration) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match Self::try_lock(&file) {
                Ok(()) => return Ok(Self { _file: file, path }),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::WouldBlock,
                            format!("{} is locked by another process", path.display()),
                        ));
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Platform-specific lock acquisition
    #[cfg(unix)]
    fn try_lock(file: &File) -> io::Result<()> {
        use libc::{flock, LOCK_EX, LOCK_NB};

        let fd = file.as_raw_fd();
        // SAFETY: fd is a valid open descriptor owned by `file` for the call.
        let result = unsafe { flock(fd, LOCK_EX | LOCK_NB) };
        if result != 0 {
            let err = io::Error::last_os_error();
            return match err.raw_os_error() {
                Some(code) if code == libc::EWOULDBLOCK => {
                    Err(io::Error::new(io::ErrorKind::WouldBlock, err))
                }
                _ => Err(err),
            };
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn try_lock(_file: &File) -> io::Result<()> {
        // No advisory locking on this platform
        Ok(())
    }

    /// Get the path of the locked file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
