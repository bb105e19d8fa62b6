//! Flat-directory file storage.
//!
//! The only module that touches the filesystem. Every operation is confined
//! to one sandbox directory created at startup; filenames are base names
//! only, and anything carrying a path separator is rejected before the
//! filesystem is consulted. Error values carry the exact wire-visible
//! message the router serializes into the `data` field.

use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sandboxed storage root shared by all connection workers.
///
/// Stateless per request apart from the per-filename lock table, which
/// serializes concurrent upload/delete of the same name so stored content
/// is never an interleaving of two writers.
pub struct Storage {
    root: PathBuf,
    name_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Storage {
    /// Open the storage root, creating the directory if absent.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            name_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate stored files that carry an extension, like the original
    /// `*.*` listing: regular files only, no dotfiles.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') && name.contains('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read the full content of a stored file.
    pub fn get(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            bail!("File {name} tidak ditemukan");
        }
        Ok(fs::read(path)?)
    }

    /// Write (or overwrite) a file under the sandbox root.
    pub fn upload(&self, name: &str, content: &[u8]) -> Result<()> {
        let path = self.resolve(name)?;
        let lock = self.name_lock(name);
        let _guard = lock.lock();
        fs::write(path, content)?;
        Ok(())
    }

    /// Remove a stored file.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        let lock = self.name_lock(name);
        let _guard = lock.lock();
        if !path.is_file() {
            bail!("File {name} tidak ditemukan");
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Validate a base filename and join it onto the root. Separators are
    /// rejected here so no operation can reach outside the sandbox.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            bail!("Nama file tidak valid");
        }
        Ok(self.root.join(name))
    }

    fn name_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.name_locks
            .lock()
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (TempDir, Storage) {
        let tmp = TempDir::new().unwrap();
        let st = Storage::open(tmp.path().join("files")).unwrap();
        (tmp, st)
    }

    #[test]
    fn open_creates_missing_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("a").join("files");
        let st = Storage::open(&root).unwrap();
        assert!(st.root().is_dir());
    }

    #[test]
    fn upload_get_round_trip() {
        let (_tmp, st) = storage();
        let content = b"Hello, filebox!\x00\x01\x02";
        st.upload("a.bin", content).unwrap();
        assert_eq!(st.get("a.bin").unwrap(), content);
    }

    #[test]
    fn upload_overwrites() {
        let (_tmp, st) = storage();
        st.upload("a.txt", b"first").unwrap();
        st.upload("a.txt", b"second").unwrap();
        assert_eq!(st.get("a.txt").unwrap(), b"second");
    }

    #[test]
    fn get_missing_reports_not_found() {
        let (_tmp, st) = storage();
        let err = st.get("missing.txt").unwrap_err();
        assert_eq!(err.to_string(), "File missing.txt tidak ditemukan");
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let (_tmp, st) = storage();
        st.upload("a.txt", b"x").unwrap();
        st.delete("a.txt").unwrap();
        let err = st.get("a.txt").unwrap_err();
        assert_eq!(err.to_string(), "File a.txt tidak ditemukan");
    }

    #[test]
    fn delete_missing_reports_not_found() {
        let (_tmp, st) = storage();
        let err = st.delete("ghost.txt").unwrap_err();
        assert_eq!(err.to_string(), "File ghost.txt tidak ditemukan");
    }

    #[test]
    fn list_returns_exactly_uploaded_names_with_extension() {
        let (_tmp, st) = storage();
        st.upload("a.txt", b"1").unwrap();
        st.upload("b.dat", b"2").unwrap();
        st.upload("noext", b"3").unwrap();
        st.upload(".hidden.txt", b"4").unwrap();
        assert_eq!(st.list().unwrap(), vec!["a.txt".to_string(), "b.dat".to_string()]);
    }

    #[test]
    fn list_skips_directories() {
        let (_tmp, st) = storage();
        fs::create_dir(st.root().join("sub.dir")).unwrap();
        st.upload("a.txt", b"1").unwrap();
        assert_eq!(st.list().unwrap(), vec!["a.txt".to_string()]);
    }

    #[test]
    fn separators_rejected_on_every_operation() {
        let (_tmp, st) = storage();
        for bad in ["../evil.txt", "a/b.txt", "a\\b.txt", ""] {
            assert_eq!(st.upload(bad, b"x").unwrap_err().to_string(), "Nama file tidak valid");
            assert_eq!(st.get(bad).unwrap_err().to_string(), "Nama file tidak valid");
            assert_eq!(st.delete(bad).unwrap_err().to_string(), "Nama file tidak valid");
        }
        // Nothing escaped the sandbox
        assert!(st.list().unwrap().is_empty());
    }
}
