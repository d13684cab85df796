// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Metadata query capability used by the path walk
//!
//! The walk never touches the filesystem directly. Every query goes through a
//! [`MetadataSource`], which makes the walk testable against an in-memory tree
//! and lets callers plug in other backends.

use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::types::{FileKind, FileMetadata};

/// Single-path metadata queries.
///
/// Implementations must not cache: each call reflects the state of the tree at
/// the time of the call.
pub trait MetadataSource {
    /// Stat `path` without following a final symlink.
    fn lstat(&self, path: &Path) -> io::Result<FileMetadata>;

    /// Target of the symlink at `path`, unmodified.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Base used for relative input paths.
    fn current_dir(&self) -> io::Result<PathBuf>;
}

impl<T: MetadataSource + ?Sized> MetadataSource for &T {
    fn lstat(&self, path: &Path) -> io::Result<FileMetadata> {
        (**self).lstat(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        (**self).read_link(path)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        (**self).current_dir()
    }
}

/// The local filesystem as seen by this process
#[derive(Clone, Copy, Debug, Default)]
pub struct HostMetadata;

impl MetadataSource for HostMetadata {
    fn lstat(&self, path: &Path) -> io::Result<FileMetadata> {
        let meta = fs::symlink_metadata(path)?;
        Ok(FileMetadata::from(&meta))
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}

impl From<&fs::Metadata> for FileMetadata {
    fn from(meta: &fs::Metadata) -> Self {
        let file_type = meta.file_type();
        let kind = if file_type.is_symlink() {
            FileKind::Symlink
        } else if file_type.is_dir() {
            FileKind::Directory
        } else if file_type.is_file() {
            FileKind::Regular
        } else {
            FileKind::Other
        };
        FileMetadata::new(kind, meta.mode(), meta.uid(), meta.gid())
    }
}
