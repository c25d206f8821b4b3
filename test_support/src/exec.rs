//! Helpers for creating executable stubs in tests.
//!
//! These utilities write tiny shell scripts and mark them executable so tests
//! can exercise compiler probing without depending on a real toolchain.
//! Callers own the containing directory's lifetime to keep the stub on disk.
//!
//! # Examples
//!
//! ```rust
//! use camino::Utf8Path;
//! use tempfile::TempDir;
//! use test_support::write_exec;
//!
//! let temp = TempDir::new().expect("tempdir");
//! let root = Utf8Path::from_path(temp.path()).expect("utf8 path");
//! let path = write_exec(root, "tool", "exit 0").expect("stub executable");
//! assert!(path.exists());
//! ```

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Write a shell script named `name` inside `root` running `body`.
pub fn write_exec(root: &Utf8Path, name: &str, body: &str) -> Result<Utf8PathBuf> {
    let path = root.join(name);
    fs::write(path.as_std_path(), format!("#!/bin/sh\n{body}\n"))
        .with_context(|| format!("write exec stub {name}"))?;
    make_executable(&path)?;
    Ok(path)
}

/// Mark an existing file as executable on Unix; no-op elsewhere.
pub fn make_executable(path: &Utf8Path) -> Result<()> {
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(path.as_std_path())
            .context("stat exec stub")?
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path.as_std_path(), perms).context("chmod exec stub")?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

/// A fake compiler that rejects a fixed set of flags.
///
/// Every invocation appends its arguments as one line to [`FakeCompiler::log`].
/// The script exits with status 1 when any argument is in the rejected set;
/// otherwise it drains stdin, creates the `-o` file and exits 0.
#[derive(Debug, Clone)]
pub struct FakeCompiler {
    /// Path of the executable.
    pub path: Utf8PathBuf,
    /// File the script appends its argument lists to.
    pub log: Utf8PathBuf,
}

impl FakeCompiler {
    /// Write the compiler `name` into `root`.
    ///
    /// # Errors
    ///
    /// Returns an error when the script cannot be written.
    pub fn create(root: &Utf8Path, name: &str, rejected: &[&str]) -> Result<Self> {
        let log = root.join(format!("{name}.log"));
        let cases = if rejected.is_empty() {
            String::new()
        } else {
            format!("    {}) exit 1 ;;\n", rejected.join("|"))
        };
        let body = format!(
            concat!(
                "echo \"$*\" >> '{log}'\n",
                "out=''\n",
                "while [ $# -gt 0 ]; do\n",
                "  case \"$1\" in\n",
                "{cases}",
                "    -o) shift; out=\"$1\" ;;\n",
                "  esac\n",
                "  shift\n",
                "done\n",
                "cat > /dev/null\n",
                "[ -n \"$out\" ] && : > \"$out\"\n",
                "exit 0",
            ),
            log = log,
            cases = cases,
        );
        let path = write_exec(root, name, &body)?;
        Ok(Self { path, log })
    }

    /// Argument lists of every invocation so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.log.as_std_path())
            .map(|text| text.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}
