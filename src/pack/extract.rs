//! Collision-safe archive extraction.
//!
//! Extraction never overwrites an existing file. When the destination already holds
//! something whose kind (file or directory) disagrees with the archive, the whole
//! archive goes to a freshly allocated sibling directory instead.
//!
//! Concurrent extraction into the same destination is not race-free; callers
//! serialize it.

use crate::error::{ImportError, Result};
use rand::Rng;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Initial length of a generated directory name.
pub const RANDOM_NAME_LENGTH: usize = 8;

/// Attempts at one name length before the length grows by one.
pub const MAX_ATTEMPTS_PER_LENGTH: usize = 100;

/// Extract `archive` into `destination`, returning the root actually used.
///
/// A failed extraction removes everything it created.
pub fn extract<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    destination: &Path,
) -> Result<PathBuf> {
    extract_with_rng(archive, destination, &mut rand::rng())
}

/// [`extract`] with an explicit random source for conflict directory names.
pub fn extract_with_rng<R, G>(
    archive: &mut ZipArchive<R>,
    destination: &Path,
    rng: &mut G,
) -> Result<PathBuf>
where
    R: Read + Seek,
    G: Rng + ?Sized,
{
    if !destination.exists() {
        let created_root = topmost_missing(destination);
        fs::create_dir_all(destination)?;
        extract_fresh(archive, destination, &created_root)?;
        log::debug!("Extracted archive into new directory {:?}", destination);
        return Ok(destination.to_path_buf());
    }

    if has_type_conflict(archive, destination)? {
        let parent = destination.parent().unwrap_or_else(|| Path::new("."));
        let fallback = allocate_unique_dir(parent, rng)?;
        log::warn!(
            "{:?} conflicts with archive contents, extracting into {:?}",
            destination,
            fallback
        );
        extract_fresh(archive, &fallback, &fallback)?;
        return Ok(fallback);
    }

    let mut created = Vec::new();
    if let Err(e) = extract_missing(archive, destination, &mut created) {
        roll_back(&created);
        return Err(e);
    }
    log::debug!(
        "Reused {:?}, created {} missing paths",
        destination,
        created.len()
    );
    Ok(destination.to_path_buf())
}

/// Check whether any existing path under `root` has a different kind than the archive
/// needs there. Parents of an entry must be directories even without a directory entry.
pub fn has_type_conflict<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    root: &Path,
) -> Result<bool> {
    if !root.is_dir() {
        return Ok(true);
    }
    for index in 0..archive.len() {
        let (relative, is_dir_entry) = entry_info(archive, index)?;
        let blocked_parent = relative
            .ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| root.join(p))
            .find(|p| p.exists() && !p.is_dir());
        if let Some(parent) = blocked_parent {
            log::debug!("Type conflict at {:?}", parent);
            return Ok(true);
        }

        let full_path = root.join(relative);
        if !full_path.exists() {
            continue;
        }
        if (is_dir_entry && !full_path.is_dir()) || (!is_dir_entry && !full_path.is_file()) {
            log::debug!("Type conflict at {:?}", full_path);
            return Ok(true);
        }
    }
    Ok(false)
}

/// Create and return a new randomly named directory under `parent`.
///
/// Names are lowercase letters. After [`MAX_ATTEMPTS_PER_LENGTH`] collisions the
/// name grows by one character, so allocation always terminates.
pub fn allocate_unique_dir<G: Rng + ?Sized>(parent: &Path, rng: &mut G) -> Result<PathBuf> {
    let mut length = RANDOM_NAME_LENGTH;
    let mut attempts = 0usize;
    loop {
        let candidate = parent.join(random_name(rng, length));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                attempts += 1;
                if attempts >= MAX_ATTEMPTS_PER_LENGTH {
                    length += 1;
                    attempts = 0;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn random_name<G: Rng + ?Sized>(rng: &mut G, length: usize) -> String {
    (0..length).map(|_| rng.random_range('a'..='z')).collect()
}

/// Outermost ancestor of `path` that does not exist yet.
fn topmost_missing(path: &Path) -> PathBuf {
    path.ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .last()
        .unwrap_or(path)
        .to_path_buf()
}

/// Extract everything into `root`, a directory this call created under `created_root`.
fn extract_fresh<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    root: &Path,
    created_root: &Path,
) -> Result<()> {
    let mut created = Vec::new();
    for index in 0..archive.len() {
        if let Err(e) = extract_entry(archive, index, root, &mut created) {
            if let Err(cleanup) = fs::remove_dir_all(created_root) {
                log::warn!("Could not remove {:?}: {}", created_root, cleanup);
            }
            return Err(e);
        }
    }
    Ok(())
}

fn extract_missing<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    root: &Path,
    created: &mut Vec<PathBuf>,
) -> Result<()> {
    for index in 0..archive.len() {
        let (relative, _) = entry_info(archive, index)?;
        if !root.join(&relative).exists() {
            extract_entry(archive, index, root, created)?;
        }
    }
    Ok(())
}

/// Remove `created` paths, newest first.
fn roll_back(created: &[PathBuf]) {
    for path in created.iter().rev() {
        let removed = if path.is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        if let Err(e) = removed {
            log::warn!("Could not remove {:?}: {}", path, e);
        }
    }
}

/// Archive-relative path of an entry and whether it is a directory.
fn entry_info<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
) -> Result<(PathBuf, bool)> {
    let file = archive.by_index(index)?;
    let relative = file
        .enclosed_name()
        .ok_or_else(|| unsafe_entry(file.name()))?;
    Ok((relative, file.is_dir()))
}

fn unsafe_entry(name: &str) -> ImportError {
    ImportError::InvalidArchive(format!("entry escapes the archive root: {}", name))
}

/// Create `dir` and its missing parents, recording each one created.
fn create_dirs(dir: &Path, created: &mut Vec<PathBuf>) -> Result<()> {
    let missing: Vec<&Path> = dir
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .collect();
    for path in missing.into_iter().rev() {
        fs::create_dir(path)?;
        created.push(path.to_path_buf());
    }
    Ok(())
}

fn extract_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    root: &Path,
    created: &mut Vec<PathBuf>,
) -> Result<()> {
    let (relative, is_dir) = entry_info(archive, index)?;
    let target = root.join(relative);

    if is_dir {
        return create_dirs(&target, created);
    }

    if let Some(parent) = target.parent() {
        create_dirs(parent, created)?;
    }
    // create_new refuses to replace a file that appeared after the existence checks.
    let mut out = OpenOptions::new().write(true).create_new(true).open(&target)?;
    created.push(target);
    let mut file = archive.by_index(index)?;
    io::copy(&mut file, &mut out)?;
    Ok(())
}
