// src/fs/path.rs

//! Path helpers for suite paths and configured directories.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Normalise a user-supplied suite path.
///
/// - surrounding whitespace is trimmed
/// - a leading `~` expands to the home directory
/// - relative paths are made absolute against the working directory
/// - `.` and `..` components are collapsed lexically (symlinks are left alone)
pub fn normalize_suite_path(raw: &str) -> io::Result<PathBuf> {
    let expanded = expand_home(raw.trim());
    make_absolute(&expanded)
}

/// Absolute, lexically clean version of `path`.
pub fn make_absolute(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(clean(&absolute))
}

fn expand_home(raw: &str) -> PathBuf {
    let Some(rest) = raw.strip_prefix('~') else {
        return PathBuf::from(raw);
    };
    // `~user` is left untouched; only the current user's home is expanded.
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\')) {
        return PathBuf::from(raw);
    }
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(raw),
    }
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pops past the root.
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
