// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Identity lookups against the system user database

use std::ffi::{CStr, CString};
use std::io;

use nix::unistd::{Uid, User};
use tracing::debug;
use unix_access_core::{AccessError, AccessResult, IdentityResolver, Principal};

/// Resolves users through the passwd and group databases (NSS on Linux).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemIdentity;

impl SystemIdentity {
    fn principal_for(user: User) -> AccessResult<Principal> {
        let groups = supplementary_groups(&user)?;
        debug!(
            user = %user.name,
            uid = user.uid.as_raw(),
            gid = user.gid.as_raw(),
            groups = ?groups,
            "Resolved principal"
        );
        Ok(Principal::new(user.uid.as_raw(), user.gid.as_raw(), groups))
    }
}

impl IdentityResolver for SystemIdentity {
    fn resolve_by_uid(&self, uid: u32) -> AccessResult<Principal> {
        let user = User::from_uid(Uid::from_raw(uid))
            .map_err(|errno| AccessError::IdentityLookup(io::Error::from(errno)))?
            .ok_or_else(|| AccessError::UnknownPrincipal(format!("uid {uid}")))?;
        Self::principal_for(user)
    }

    fn resolve_by_name(&self, name: &str) -> AccessResult<Principal> {
        let user = User::from_name(name)
            .map_err(|errno| AccessError::IdentityLookup(io::Error::from(errno)))?
            .ok_or_else(|| AccessError::UnknownPrincipal(format!("user {name}")))?;
        Self::principal_for(user)
    }
}

fn supplementary_groups(user: &User) -> AccessResult<Vec<u32>> {
    let name = CString::new(user.name.as_bytes()).map_err(|_| {
        AccessError::IdentityLookup(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("user name {:?} contains a NUL byte", user.name),
        ))
    })?;
    group_list(&name, user.gid.as_raw())
}

#[cfg(not(target_vendor = "apple"))]
fn group_list(name: &CStr, gid: u32) -> AccessResult<Vec<u32>> {
    use nix::unistd::Gid;

    let groups = nix::unistd::getgrouplist(name, Gid::from_raw(gid))
        .map_err(|errno| AccessError::IdentityLookup(io::Error::from(errno)))?;
    Ok(groups.into_iter().map(Gid::as_raw).collect())
}

/// nix does not expose `getgrouplist` on Apple targets, where the call takes
/// `c_int` group ids and only reports a short buffer by returning -1.
#[cfg(target_vendor = "apple")]
fn group_list(name: &CStr, gid: u32) -> AccessResult<Vec<u32>> {
    const MAX_GROUPS: usize = 1 << 16;

    let mut capacity = 32;
    loop {
        let mut groups: Vec<libc::c_int> = vec![0; capacity];
        let mut count = capacity as libc::c_int;
        // SAFETY: `name` is NUL terminated and `groups` has room for `count` entries.
        let ret = unsafe {
            libc::getgrouplist(
                name.as_ptr(),
                gid as libc::c_int,
                groups.as_mut_ptr(),
                &mut count,
            )
        };
        if ret >= 0 {
            groups.truncate(count.max(0) as usize);
            return Ok(groups.into_iter().map(|g| g as u32).collect());
        }
        if capacity >= MAX_GROUPS {
            return Err(AccessError::IdentityLookup(io::Error::other(format!(
                "group list for {name:?} exceeds {MAX_GROUPS} entries"
            ))));
        }
        capacity *= 2;
    }
}
