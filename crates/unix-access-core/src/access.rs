// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Access checks for users identified by uid or name

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::config::AccessPolicy;
use crate::error::AccessResult;
use crate::identity::IdentityResolver;
use crate::metadata::MetadataSource;
use crate::types::{AccessMode, Principal};
use crate::walk::Walker;

/// Answers "may this user access this path with this mode".
///
/// The checker holds no per-call state, so one instance can serve concurrent
/// checks from several threads as long as its collaborators allow it. Every
/// call resolves the identity and walks the path afresh.
#[derive(Debug)]
pub struct AccessChecker<M, I> {
    metadata: M,
    identity: I,
    policy: AccessPolicy,
}

impl<M: MetadataSource, I: IdentityResolver> AccessChecker<M, I> {
    pub fn new(metadata: M, identity: I) -> Self {
        Self {
            metadata,
            identity,
            policy: AccessPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Check `mode` on `path` for the user with the given uid.
    ///
    /// Identity lookup failures are returned as they come from the resolver.
    #[instrument(skip(self, mode, path), fields(path = %path.display(), mode = %mode))]
    pub fn check_access_by_uid(&self, uid: u32, mode: AccessMode, path: &Path) -> AccessResult<()> {
        let principal = self.identity.resolve_by_uid(uid)?;
        self.check_principal(&principal, mode, path)
    }

    /// Check `mode` on `path` for the user with the given name.
    #[instrument(skip(self, mode, path), fields(path = %path.display(), mode = %mode))]
    pub fn check_access_by_username(
        &self,
        username: &str,
        mode: AccessMode,
        path: &Path,
    ) -> AccessResult<()> {
        let principal = self.identity.resolve_by_name(username)?;
        self.check_principal(&principal, mode, path)
    }

    /// Check `mode` on `path` for an already resolved principal.
    pub fn check_principal(
        &self,
        principal: &Principal,
        mode: AccessMode,
        path: &Path,
    ) -> AccessResult<()> {
        self.resolve(principal, mode, path).map(|_| ())
    }

    /// Like [`check_principal`](Self::check_principal), returning the
    /// canonical path access was granted on.
    pub fn resolve(
        &self,
        principal: &Principal,
        mode: AccessMode,
        path: &Path,
    ) -> AccessResult<PathBuf> {
        debug!(
            uid = principal.uid(),
            path = %path.display(),
            mode = %mode,
            "Checking path access"
        );
        let resolved = Walker::new(&self.metadata, principal, &self.policy).resolve(path, mode)?;
        debug!(resolved = %resolved.display(), "Access granted");
        Ok(resolved)
    }
}
