// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! User-space path resolution with classic *nix permission checks
//!
//! Answers whether a given user may access a path with a given mode by walking
//! the path one component at a time, following symlinks and checking owner,
//! group and other bits on the way. The check runs without switching
//! credentials; it only needs to be able to stat the path.
//!
//! Filesystem metadata and user identities come in through the
//! [`MetadataSource`] and [`IdentityResolver`] traits.

pub mod access;
pub mod config;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod permission;
pub mod types;
mod walk;


pub use access::AccessChecker;
pub use config::{AccessPolicy, ConfigError, DEFAULT_MAX_SYMLINKS};
pub use error::{AccessError, AccessResult, ParseAccessModeError, PermissionDenial};
pub use identity::IdentityResolver;
pub use metadata::{HostMetadata, MetadataSource};
pub use permission::{check_permission, permits};
pub use types::{AccessMode, FileKind, FileMetadata, Principal};
