//! Durable file I/O (C1).
//!
//! Encrypting or decrypting a file is only as durable as the underlying
//! `flush`/`fsync` discipline. [`flush_durable`] flushes userspace buffers
//! and then asks the platform for the strongest available durability
//! guarantee, falling back gracefully where a filesystem driver doesn't
//! support it (the macOS `F_FULLFSYNC`/`ENOTTY` case below is adapted from
//! the backend's own `safe_sync` helper).

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Opens the input and output files for one codec job.
///
/// Exists as a trait (rather than calling `std::fs::File` directly from the
/// pipeline) so tests can substitute files that simulate short reads or
/// transient failures without touching the real filesystem.
pub trait FileIoFactory: Send + Sync {
    fn open_input(&self, path: &Path) -> io::Result<File>;
    fn create_output(&self, path: &Path) -> io::Result<File>;
}

/// The production [`FileIoFactory`]: plain `std::fs` calls, with a
/// best-effort sequential-access hint on Linux.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileIo;

impl FileIoFactory for StdFileIo {
    fn open_input(&self, path: &Path) -> io::Result<File> {
        let file = File::open(path)?;
        hint_sequential(&file);
        Ok(file)
    }

    fn create_output(&self, path: &Path) -> io::Result<File> {
        File::create(path)
    }
}

#[cfg(target_os = "linux")]
fn hint_sequential(file: &File) {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let rc = unsafe { libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_SEQUENTIAL) };
    if rc != 0 {
        tracing::debug!(errno = rc, "posix_fadvise(SEQUENTIAL) hint failed, ignoring");
    }
}

#[cfg(not(target_os = "linux"))]
fn hint_sequential(_file: &File) {}

/// Flush `file`'s userspace write buffer and sync it to stable storage.
///
/// Returns `Ok(true)` when the platform's strongest durability guarantee was
/// obtained, `Ok(false)` when the write completed but the backing store
/// doesn't support that guarantee (observed on some macOS network
/// filesystem drivers), and `Err` for a genuine I/O failure.
#[tracing::instrument(level = "debug", skip(file))]
pub fn flush_durable(file: &mut File) -> io::Result<bool> {
    file.flush()?;
    platform_sync(file)
}

#[cfg(target_os = "macos")]
fn platform_sync(file: &File) -> io::Result<bool> {
    // ENOTTY ("inappropriate ioctl for device") is what some network
    // filesystem drivers return for F_FULLFSYNC; sync_data is the fallback,
    // and if even that fails the same way the write still landed, just
    // without the stronger guarantee.
    const ENOTTY: i32 = 25;

    match file.sync_all() {
        Ok(()) => Ok(true),
        Err(e) if e.raw_os_error() == Some(ENOTTY) => match file.sync_data() {
            Ok(()) => Ok(false),
            Err(e2) if e2.raw_os_error() == Some(ENOTTY) => {
                tracing::debug!("backing store does not support fsync, proceeding without it");
                Ok(false)
            }
            Err(e2) => Err(e2),
        },
        Err(e) => Err(e),
    }
}

#[cfg(target_os = "linux")]
fn platform_sync(file: &File) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    file.sync_all()?;
    // Best-effort hint that this file's pages can be dropped from the page
    // cache once written; failure here doesn't affect durability and isn't
    // worth surfacing as an error.
    let fd = file.as_raw_fd();
    unsafe {
        libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_DONTNEED);
    }
    Ok(true)
}

#[cfg(target_os = "windows")]
fn platform_sync(file: &File) -> io::Result<bool> {
    use std::os::windows::io::AsRawHandle;
    use windows_sys::Win32::Storage::FileSystem::FlushFileBuffers;

    let handle = file.as_raw_handle();
    let ok = unsafe { FlushFileBuffers(handle as _) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(true)
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn platform_sync(file: &File) -> io::Result<bool> {
    file.sync_all()?;
    Ok(true)
}

/// Truncate `file` to exactly `len` bytes. Used to fix up a decrypted
/// output's length to the original (pre-padding) size recorded in the
/// header, since block encryption always writes whole, sector-aligned
/// blocks.
pub fn truncate(file: &File, len: u64) -> io::Result<()> {
    file.set_len(len)
}
