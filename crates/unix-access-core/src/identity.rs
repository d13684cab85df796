// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Identity resolution seam

use crate::error::AccessResult;
use crate::types::Principal;

/// Turns a uid or username into a [`Principal`] with its full group set.
///
/// Implementations report a missing entry as
/// [`AccessError::UnknownPrincipal`](crate::AccessError::UnknownPrincipal) and
/// any failure of the underlying database as
/// [`AccessError::IdentityLookup`](crate::AccessError::IdentityLookup). Errors
/// are never retried and never turned into a permission denial.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityResolver {
    fn resolve_by_uid(&self, uid: u32) -> AccessResult<Principal>;
    fn resolve_by_name(&self, name: &str) -> AccessResult<Principal>;
}

impl<T: IdentityResolver + ?Sized> IdentityResolver for &T {
    fn resolve_by_uid(&self, uid: u32) -> AccessResult<Principal> {
        (**self).resolve_by_uid(uid)
    }

    fn resolve_by_name(&self, name: &str) -> AccessResult<Principal> {
        (**self).resolve_by_name(name)
    }
}
