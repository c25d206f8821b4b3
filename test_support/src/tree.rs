//! Temporary source trees for header scanning and end-to-end tests.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

/// A temporary directory populated with files, removed on drop.
///
/// # Examples
///
/// ```rust
/// use test_support::SourceTree;
///
/// let tree = SourceTree::new(&[("src/main.c", "#include \"util.h\"\n")]).expect("tree");
/// assert!(tree.path("src/main.c").exists());
/// ```
#[derive(Debug)]
pub struct SourceTree {
    dir: TempDir,
    root: Utf8PathBuf,
}

impl SourceTree {
    /// Create a tree containing `files`, given as `(relative path, contents)`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory or a file cannot be created.
    pub fn new(files: &[(&str, &str)]) -> Result<Self> {
        let dir = TempDir::new().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("temp dir {} is not UTF-8", path.display()))?;
        let tree = Self { dir, root };
        for (name, contents) in files {
            tree.write(name, contents)?;
        }
        Ok(tree)
    }

    /// Write `contents` to `name`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write(&self, name: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// Root of the tree.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path of `name` inside the tree.
    #[must_use]
    pub fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Read a file from the tree.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read.
    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.path(name);
        fs::read_to_string(&path).with_context(|| format!("read {path}"))
    }

    /// Underlying temporary directory.
    #[must_use]
    pub const fn temp_dir(&self) -> &TempDir {
        &self.dir
    }
}
