// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Permission check on a single path component

use std::path::Path;

use tracing::debug;

use crate::error::{AccessError, AccessResult, PermissionDenial};
use crate::types::{AccessMode, FileMetadata, Principal};

/// Whether `principal` holds every bit of `wanted` on a node with `meta`.
///
/// Each class is evaluated jointly with its own membership test: the owner
/// triplet counts only when the uid matches, the group triplet only when the
/// file's group is one of the principal's groups, and the other triplet always.
/// Access is granted when any one class carries all wanted bits.
///
/// uid 0 gets no special treatment.
pub fn permits(principal: &Principal, wanted: AccessMode, meta: &FileMetadata) -> bool {
    let want = wanted.bits();
    let mode = meta.permissions();

    let owner = ((mode >> 6) & want) == want && principal.uid() == meta.uid;
    let group = ((mode >> 3) & want) == want && principal.in_group(meta.gid);
    let other = (mode & want) == want;

    owner || group || other
}

/// Checks `wanted` on the component at `path`, building the denial record
/// from `meta` when the check fails.
pub fn check_permission(
    principal: &Principal,
    wanted: AccessMode,
    path: &Path,
    meta: &FileMetadata,
) -> AccessResult<()> {
    if permits(principal, wanted, meta) {
        return Ok(());
    }

    debug!(
        path = %path.display(),
        uid = principal.uid(),
        wanted = %wanted,
        file_mode = format_args!("{:o}", meta.permissions()),
        file_uid = meta.uid,
        file_gid = meta.gid,
        "Permission check failed"
    );

    Err(AccessError::from(PermissionDenial {
        path: path.to_path_buf(),
        file_mode: meta.permissions(),
        file_uid: meta.uid,
        file_gid: meta.gid,
        uid: principal.uid(),
        gids: principal.groups().iter().copied().collect(),
        wanted,
    }))
}
