// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
}

/// In-memory filesystem for tests.
///
/// Paths are compared verbatim; tests are expected to use absolute paths.
/// Clones share the same underlying tree.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    read_only: Arc<Mutex<bool>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock();
        if let Some(parent) = path.parent() {
            Self::insert_dirs(&mut entries, parent);
        }
        entries.insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock();
        Self::insert_dirs(&mut entries, path.as_ref());
    }

    /// Make every subsequent write fail, to exercise I/O error paths.
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.lock() = read_only;
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let entries = self.entries.lock();
        let mut files: Vec<PathBuf> = entries
            .iter()
            .filter(|(_, e)| matches!(e, MockEntry::File(_)))
            .map(|(p, _)| p.clone())
            .collect();
        files.sort();
        files
    }

    /// Contents of the file at `path`, if there is one.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.entries.lock().get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    fn insert_dirs(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Dir);
        }
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if *self.read_only.lock() {
            return Err(anyhow!("read-only filesystem: {:?}", path));
        }
        Ok(())
    }
}

impl FileSystem for MockFileSystem {
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.check_writable(path)?;
        self.add_file(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.check_writable(path)?;
        if matches!(
            self.entries.lock().get(path),
            Some(MockEntry::File(_))
        ) {
            return Err(anyhow!("Not a directory: {:?}", path));
        }
        self.add_dir(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.lock().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.entries.lock().get(path),
            Some(MockEntry::Dir)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_a_file_creates_its_parents() {
        let fs = MockFileSystem::new();
        fs.add_file("/suites/login/smoke.robot", "*** Test Cases ***");

        assert!(fs.is_dir(Path::new("/suites/login")));
        assert!(fs.is_dir(Path::new("/suites")));
        assert!(fs.exists(Path::new("/suites/login/smoke.robot")));
        assert!(!fs.is_dir(Path::new("/suites/login/smoke.robot")));
        assert_eq!(
            fs.contents("/suites/login/smoke.robot").as_deref(),
            Some(&b"*** Test Cases ***"[..])
        );
        assert!(fs.contents("/suites/login").is_none());
    }

    #[test]
    fn read_only_mode_rejects_writes() {
        let fs = MockFileSystem::new();
        fs.set_read_only(true);
        assert!(fs.write(Path::new("/out/stdout.txt"), b"x").is_err());
        assert!(fs.create_dir_all(Path::new("/out")).is_err());
        assert!(fs.files().is_empty());
    }
}
