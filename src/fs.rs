//! Filesystem helpers for moving dependency trees into layers
//!
//! Every failure carries the paths involved so build logs show what
//! could not be read, copied or removed.

use crate::error::{ModlayerError, ModlayerResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Whether `path` exists. Errors other than "not found" are reported.
pub fn exists(path: &Path) -> ModlayerResult<bool> {
    path.try_exists()
        .map_err(|e| ModlayerError::io(format!("unable to stat {}", path.display()), e))
}

/// Whether `path` is a directory containing at least one directory.
///
/// A missing `path` is not an error. Symlinks to directories do not count.
pub fn has_subdirs(path: &Path) -> ModlayerResult<bool> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(ModlayerError::io(
                format!("reading directory {}", path.display()),
                e,
            ))
        }
    };

    for entry in entries {
        let entry = entry
            .map_err(|e| ModlayerError::io(format!("reading directory {}", path.display()), e))?;
        let file_type = entry.file_type().map_err(|e| {
            ModlayerError::io(format!("unable to stat {}", entry.path().display()), e)
        })?;
        if file_type.is_dir() {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Recursively copy `from` into `to`, creating `to` if needed.
///
/// Symlinks are recreated rather than followed, which keeps the relative
/// links npm writes under `node_modules/.bin` intact.
pub fn copy_dir(from: &Path, to: &Path) -> ModlayerResult<()> {
    copy_tree(from, to).map_err(|source| ModlayerError::CopyDir {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;

    for entry in WalkDir::new(from).min_depth(1).follow_links(false) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    let points_to = fs::read_link(link)?;
    if target.symlink_metadata().is_ok() {
        fs::remove_file(target)?;
    }
    std::os::unix::fs::symlink(points_to, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
    fs::copy(link, target).map(|_| ())
}

/// Remove a directory tree. Already-missing directories are fine.
pub fn remove_dir(path: &Path) -> ModlayerResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ModlayerError::io(
            format!("unable to remove {}", path.display()),
            e,
        )),
    }
}

/// Copy `from` to `to` and then delete `from`.
///
/// Runs on the blocking pool since dependency trees can be large.
pub async fn relocate(from: PathBuf, to: PathBuf) -> ModlayerResult<()> {
    debug!("Relocating {} to {}", from.display(), to.display());

    tokio::task::spawn_blocking(move || {
        copy_dir(&from, &to)?;
        remove_dir(&from)
    })
    .await
    .map_err(|e| ModlayerError::Internal(format!("relocation task failed: {}", e)))?
}
