//! Local header dependency discovery.
//!
//! [`HeaderResolver`] follows `#include "..."` directives from a source file
//! and collects every reachable local header. Angle-bracket includes name
//! system headers and are never followed. Paths are kept relative to the
//! resolver root, which is the directory the generated Makefile runs in.
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use kumiki::headers::HeaderResolver;
//!
//! let dir = tempfile::tempdir().expect("tempdir");
//! let root = Utf8Path::from_path(dir.path()).expect("utf8");
//! std::fs::write(root.join("main.c"), "#include \"util.h\"\n").expect("write");
//! std::fs::write(root.join("util.h"), "#include <stdio.h>\n").expect("write");
//!
//! let resolver = HeaderResolver::new(root);
//! let deps = resolver.resolve("main.c");
//! assert_eq!(deps.into_iter().collect::<Vec<_>>(), ["main.c", "util.h"]);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::LazyLock;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use regex::bytes::Regex;
use tracing::{debug, warn};

static LOCAL_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\t ]*#[\t ]*include[\t ]*"([^"]+)""#)
        .unwrap_or_else(|err| panic!("include pattern must compile: {err}"))
});

/// Resolves the transitive set of locally-included headers.
#[derive(Debug)]
pub struct HeaderResolver {
    root: Utf8PathBuf,
    memo: RefCell<HashMap<String, BTreeSet<String>>>,
}

impl HeaderResolver {
    /// Create a resolver whose relative paths are interpreted against `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Utf8Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Directory relative paths are resolved against.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Return `path` and every local header reachable from it.
    ///
    /// Unreadable files, including missing headers, are reported as warnings
    /// and contribute no further dependencies; the traversal never fails.
    #[must_use]
    pub fn resolve(&self, path: &str) -> BTreeSet<String> {
        if let Some(cached) = self.memo.borrow().get(path) {
            return cached.clone();
        }
        let deps = self.scan(path);
        self.memo.borrow_mut().insert(path.to_owned(), deps.clone());
        deps
    }

    fn scan(&self, path: &str) -> BTreeSet<String> {
        let mut deps = BTreeSet::from([path.to_owned()]);
        let mut queue = vec![path.to_owned()];
        while let Some(current) = queue.pop() {
            let includes = match self.local_includes(&current) {
                Ok(includes) => includes,
                Err(err) => {
                    warn!(path = %current, error = %err, "can't open file while scanning includes");
                    continue;
                }
            };
            let dir = Utf8Path::new(&current).parent().unwrap_or(Utf8Path::new(""));
            for include in includes {
                let resolved = normalize(&dir.join(&include));
                if deps.insert(resolved.clone()) {
                    debug!(from = %current, header = %resolved, "found local include");
                    queue.push(resolved);
                }
            }
        }
        deps
    }

    /// Lines are matched as bytes, so sources in legacy encodings still
    /// yield their includes. A read error part way through keeps the
    /// includes found so far.
    fn local_includes(&self, path: &str) -> std::io::Result<Vec<String>> {
        let file = File::open(self.root.join(path))?;
        let mut includes = Vec::new();
        for line in BufReader::new(file).split(b'\n') {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(path, error = %err, "stopped reading file while scanning includes");
                    break;
                }
            };
            if let Some(caps) = LOCAL_INCLUDE.captures(&line)
                && let Some(name) = caps.get(1)
            {
                includes.push(String::from_utf8_lossy(name.as_bytes()).into_owned());
            }
        }
        Ok(includes)
    }
}

/// Lexically normalise a path: drop `.` components and fold `..` into the
/// preceding normal component where there is one.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use kumiki::headers::normalize;
///
/// assert_eq!(normalize(Utf8Path::new("src/./a/../b.h")), "src/b.h");
/// assert_eq!(normalize(Utf8Path::new("src/../../inc/c.h")), "../inc/c.h");
/// ```
#[must_use]
pub fn normalize(path: &Utf8Path) -> String {
    let mut parts: Vec<Utf8Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match parts.last().copied() {
                Some(Utf8Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return ".".to_owned();
    }
    parts.iter().collect::<Utf8PathBuf>().into_string()
}
