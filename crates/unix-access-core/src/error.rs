// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for access checks

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::types::AccessMode;

/// Everything needed to explain why a check failed, captured at the moment of
/// the failing check so callers never have to query the filesystem again.
///
/// The path is the component that failed, which may be an ancestor directory
/// or a symlink rather than the path the caller asked about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionDenial {
    pub path: PathBuf,
    pub file_mode: u32,
    pub file_uid: u32,
    pub file_gid: u32,
    pub uid: u32,
    /// Primary and supplementary groups of the checked principal
    pub gids: Vec<u32>,
    /// Mode wanted on `path`; execute-only for ancestors and symlinks
    pub wanted: AccessMode,
}

impl fmt::Display for PermissionDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient permissions of user (uid {}, gid {:?}) for [{}] (uid {}, gid {}): want mode {:o}, file has mode {:o}",
            self.uid,
            self.gids,
            self.path.display(),
            self.file_uid,
            self.file_gid,
            self.wanted.bits(),
            self.file_mode
        )
    }
}

/// Outcome of a check that did not grant access
#[derive(thiserror::Error, Debug)]
pub enum AccessError {
    #[error("unknown principal: {0}")]
    UnknownPrincipal(String),
    #[error("permission denied: {0}")]
    PermissionDenied(Box<PermissionDenial>),
    #[error("too many levels of symbolic links at {}", .path.display())]
    TooManyLinks { path: PathBuf },
    #[error("not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },
    #[error("identity lookup failed: {0}")]
    IdentityLookup(#[source] io::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl AccessError {
    /// True only for a legitimate refusal, as opposed to a check that could
    /// not be completed.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, AccessError::PermissionDenied(_))
    }

    pub fn denial(&self) -> Option<&PermissionDenial> {
        match self {
            AccessError::PermissionDenied(denial) => Some(denial.as_ref()),
            _ => None,
        }
    }

    /// The errno the kernel would report for the same outcome.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            AccessError::UnknownPrincipal(_) => None,
            AccessError::PermissionDenied(_) => Some(libc::EACCES),
            AccessError::TooManyLinks { .. } => Some(libc::ELOOP),
            AccessError::NotADirectory { .. } => Some(libc::ENOTDIR),
            AccessError::IdentityLookup(err) | AccessError::Io(err) => err.raw_os_error(),
        }
    }
}

impl From<PermissionDenial> for AccessError {
    fn from(denial: PermissionDenial) -> Self {
        AccessError::PermissionDenied(Box::new(denial))
    }
}

pub type AccessResult<T> = Result<T, AccessError>;

/// Returned when an [`AccessMode`] cannot be parsed from text
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid access mode {input:?}: expected an octal digit or letters from \"rwx\"")]
pub struct ParseAccessModeError {
    pub input: String,
}
