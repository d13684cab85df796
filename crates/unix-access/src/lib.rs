// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Check whether a local user may read, write or execute a path
//!
//! The functions here resolve the user through the system databases and walk
//! the path on the local filesystem, applying the classic owner, group and
//! other mode bits at every step. The calling process needs no special
//! privileges beyond being able to stat the path.
//!
//! ```no_run
//! use std::path::Path;
//! use unix_access::{check_access_by_username, AccessMode};
//!
//! match check_access_by_username("www-data", AccessMode::READ, Path::new("/srv/site/index.html")) {
//!     Ok(()) => println!("readable"),
//!     Err(err) if err.is_permission_denied() => println!("denied: {err}"),
//!     Err(err) => eprintln!("check failed: {err}"),
//! }
//! ```

pub mod identity;

use std::path::Path;

pub use identity::SystemIdentity;
pub use unix_access_core::{
    check_permission, permits, AccessChecker, AccessError, AccessMode, AccessPolicy, AccessResult,
    ConfigError, FileKind, FileMetadata, HostMetadata, IdentityResolver, MetadataSource,
    ParseAccessModeError, PermissionDenial, Principal, DEFAULT_MAX_SYMLINKS,
};

/// Checker backed by the local filesystem and the system user database.
pub type SystemChecker = AccessChecker<HostMetadata, SystemIdentity>;

/// A checker for the local system with the default policy.
pub fn system_checker() -> SystemChecker {
    AccessChecker::new(HostMetadata, SystemIdentity)
}

/// A checker for the local system with the given policy.
pub fn system_checker_with_policy(policy: AccessPolicy) -> SystemChecker {
    system_checker().with_policy(policy)
}

/// Check `mode` on `path` for the user with the given uid.
pub fn check_access_by_uid(uid: u32, mode: AccessMode, path: &Path) -> AccessResult<()> {
    system_checker().check_access_by_uid(uid, mode, path)
}

/// Check `mode` on `path` for the user with the given name.
pub fn check_access_by_username(username: &str, mode: AccessMode, path: &Path) -> AccessResult<()> {
    system_checker().check_access_by_username(username, mode, path)
}
