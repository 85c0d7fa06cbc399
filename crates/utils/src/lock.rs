//! File access under OS advisory locks
//!
//! Readers take a shared lock and writers an exclusive one. The locks are
//! advisory: they only coordinate processes that use these helpers.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

/// Attempts at opening a file that keeps being created and removed
const OPEN_ATTEMPTS: usize = 3;

/// Read a whole file while holding a shared lock
pub fn read_shared(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    FileExt::lock_shared(&file)?;

    let mut contents = Vec::new();
    let result = file.read_to_end(&mut contents);
    let _ = FileExt::unlock(&file);

    result.map(|_| contents)
}

/// Replace a file's contents while holding an exclusive lock.
///
/// A file created by this call gets `new_file_mode`; an existing file keeps
/// its mode. Only the caller whose exclusive create succeeded applies the
/// mode. Existing files are opened without truncation and only emptied once
/// the lock is held, so readers never observe a truncated file from a writer
/// that is still waiting for the lock. Returns `true` if this call created
/// the file.
pub fn write_exclusive(path: &Path, contents: &[u8], new_file_mode: u32) -> io::Result<bool> {
    let (mut file, created) = open_for_write(path, new_file_mode)?;
    FileExt::lock_exclusive(&file)?;

    let result = (|| -> io::Result<()> {
        file.set_len(0)?;
        file.write_all(contents)?;
        file.flush()
    })();
    let _ = FileExt::unlock(&file);

    result.map(|()| created)
}

fn open_for_write(path: &Path, new_file_mode: u32) -> io::Result<(File, bool)> {
    let mut last_error = None;
    for _ in 0..OPEN_ATTEMPTS {
        let mut create = OpenOptions::new();
        create.write(true).create_new(true);
        with_mode(&mut create, new_file_mode);
        match create.open(path) {
            Ok(file) => {
                // The open mode is filtered by the umask
                set_file_mode(&file, new_file_mode)?;
                return Ok((file, true));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }

        match OpenOptions::new().write(true).open(path) {
            Ok(file) => return Ok((file, false)),
            // Removed between the two opens
            Err(e) if e.kind() == io::ErrorKind::NotFound => last_error = Some(e),
            Err(e) => return Err(e),
        }
    }
    Err(last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound)))
}

#[cfg(unix)]
fn with_mode(options: &mut OpenOptions, mode: u32) {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(mode);
}

#[cfg(not(unix))]
fn with_mode(_options: &mut OpenOptions, _mode: u32) {}

#[cfg(unix)]
fn set_file_mode(file: &File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_file_mode(_file: &File, _mode: u32) -> io::Result<()> {
    Ok(())
}
