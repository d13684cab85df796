// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! In-memory metadata source with call recording and fault injection
//!
//! Nodes are keyed by absolute path. The root directory exists from the start
//! (mode 755, owned by root); everything else is added by the test.
//!
//! # Example
//!
//! ```ignore
//! let fs = MockFs::new();
//! fs.dir("/srv", 0o750, 0, 100);
//! fs.file("/srv/data", 0o640, 0, 100);
//! fs.symlink("/srv/current", "data");
//! fs.set_behavior(FailureBehavior::FailPath {
//!     op: MockOp::Lstat,
//!     path: "/srv/data".into(),
//!     errno: libc::EIO,
//! });
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::metadata::MetadataSource;
use crate::types::{FileKind, FileMetadata};

/// Operations of [`MetadataSource`] that can be counted and failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MockOp {
    Lstat,
    ReadLink,
    CurrentDir,
}

/// Configurable failure behavior for mock metadata queries
#[derive(Clone, Debug, Default)]
pub enum FailureBehavior {
    /// Never fail
    #[default]
    AlwaysSucceed,

    /// Fail every call of `op` on exactly `path`
    FailPath {
        op: MockOp,
        path: PathBuf,
        errno: i32,
    },

    /// Let `count` calls of `op` succeed, then fail every later one
    FailAfter { op: MockOp, count: u64, errno: i32 },
}

#[derive(Clone, Debug)]
struct MockNode {
    meta: FileMetadata,
    target: Option<PathBuf>,
}

pub struct MockFs {
    nodes: Mutex<HashMap<PathBuf, MockNode>>,
    cwd: Mutex<PathBuf>,
    behavior: Mutex<FailureBehavior>,
    calls: Mutex<Vec<(MockOp, PathBuf)>>,
}

impl Default for MockFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFs {
    pub fn new() -> Self {
        let fs = Self {
            nodes: Mutex::new(HashMap::new()),
            cwd: Mutex::new(PathBuf::from("/")),
            behavior: Mutex::new(FailureBehavior::AlwaysSucceed),
            calls: Mutex::new(Vec::new()),
        };
        fs.dir("/", 0o755, 0, 0);
        fs
    }

    fn insert(&self, path: &str, meta: FileMetadata, target: Option<PathBuf>) {
        self.nodes.lock().unwrap().insert(PathBuf::from(path), MockNode { meta, target });
    }

    /// Add or replace a directory
    pub fn dir(&self, path: &str, mode: u32, uid: u32, gid: u32) {
        self.insert(path, FileMetadata::new(FileKind::Directory, mode, uid, gid), None);
    }

    /// Add or replace a regular file
    pub fn file(&self, path: &str, mode: u32, uid: u32, gid: u32) {
        self.insert(path, FileMetadata::new(FileKind::Regular, mode, uid, gid), None);
    }

    /// Add a root-owned symlink with the usual 777 mode
    pub fn symlink(&self, path: &str, target: &str) {
        self.symlink_with_mode(path, target, 0o777, 0);
    }

    pub fn symlink_with_mode(&self, path: &str, target: &str, mode: u32, uid: u32) {
        self.insert(
            path,
            FileMetadata::new(FileKind::Symlink, mode, uid, uid),
            Some(PathBuf::from(target)),
        );
    }

    pub fn set_current_dir(&self, path: &str) {
        *self.cwd.lock().unwrap() = PathBuf::from(path);
    }

    pub fn set_behavior(&self, behavior: FailureBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Number of calls of `op` since creation or the last reset
    pub fn call_count(&self, op: MockOp) -> usize {
        self.calls.lock().unwrap().iter().filter(|(o, _)| *o == op).count()
    }

    /// Paths passed to `op`, in call order
    pub fn queried_paths(&self, op: MockOp) -> Vec<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, _)| *o == op)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn queried(&self, op: MockOp, path: &str) -> bool {
        self.queried_paths(op).iter().any(|p| p == Path::new(path))
    }

    pub fn reset_counters(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Record the call and decide whether it should fail.
    fn check_fault(&self, op: MockOp, path: &Path) -> io::Result<()> {
        let previous = {
            let mut calls = self.calls.lock().unwrap();
            let previous = calls.iter().filter(|(o, _)| *o == op).count() as u64;
            calls.push((op, path.to_path_buf()));
            previous
        };

        match &*self.behavior.lock().unwrap() {
            FailureBehavior::AlwaysSucceed => Ok(()),
            FailureBehavior::FailPath {
                op: fail_op,
                path: fail_path,
                errno,
            } if *fail_op == op && fail_path == path => Err(io::Error::from_raw_os_error(*errno)),
            FailureBehavior::FailAfter {
                op: fail_op,
                count,
                errno,
            } if *fail_op == op && previous >= *count => Err(io::Error::from_raw_os_error(*errno)),
            _ => Ok(()),
        }
    }

    fn node(&self, path: &Path) -> io::Result<MockNode> {
        self.nodes
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from_raw_os_error(libc::ENOENT))
    }
}

impl MetadataSource for MockFs {
    fn lstat(&self, path: &Path) -> io::Result<FileMetadata> {
        self.check_fault(MockOp::Lstat, path)?;
        Ok(self.node(path)?.meta)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        self.check_fault(MockOp::ReadLink, path)?;
        self.node(path)?
            .target
            .ok_or_else(|| io::Error::from_raw_os_error(libc::EINVAL))
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        self.check_fault(MockOp::CurrentDir, Path::new(""))?;
        Ok(self.cwd.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_basic() {
        let fs = MockFs::new();
        fs.dir("/srv", 0o750, 0, 100);
        fs.symlink("/srv/current", "data");

        assert!(fs.lstat(Path::new("/")).unwrap().is_dir());
        assert_eq!(fs.lstat(Path::new("/srv")).unwrap().gid, 100);
        assert!(fs.lstat(Path::new("/srv/current")).unwrap().is_symlink());
        assert_eq!(fs.read_link(Path::new("/srv/current")).unwrap(), PathBuf::from("data"));
        assert_eq!(
            fs.read_link(Path::new("/srv")).unwrap_err().raw_os_error(),
            Some(libc::EINVAL)
        );
        assert_eq!(
            fs.lstat(Path::new("/nope")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(fs.call_count(MockOp::Lstat), 4);
        assert_eq!(fs.call_count(MockOp::ReadLink), 2);

        fs.reset_counters();
        assert_eq!(fs.call_count(MockOp::Lstat), 0);
    }

    #[test]
    fn test_fail_after() {
        let fs = MockFs::new();
        fs.set_behavior(FailureBehavior::FailAfter {
            op: MockOp::Lstat,
            count: 2,
            errno: libc::EIO,
        });

        assert!(fs.lstat(Path::new("/")).is_ok());
        assert!(fs.lstat(Path::new("/")).is_ok());
        let err = fs.lstat(Path::new("/")).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EIO));
        // other operations unaffected
        assert!(fs.current_dir().is_ok());
    }

    #[test]
    fn test_fail_path() {
        let fs = MockFs::new();
        fs.dir("/a", 0o755, 0, 0);
        fs.dir("/b", 0o755, 0, 0);
        fs.set_behavior(FailureBehavior::FailPath {
            op: MockOp::Lstat,
            path: PathBuf::from("/b"),
            errno: libc::EACCES,
        });

        assert!(fs.lstat(Path::new("/a")).is_ok());
        assert_eq!(
            fs.lstat(Path::new("/b")).unwrap_err().raw_os_error(),
            Some(libc::EACCES)
        );
    }
}
