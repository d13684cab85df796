// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! User-space path resolution with traverse checks
//!
//! The walk consumes the input one component at a time, growing a resolved
//! prefix that is always absolute and free of `.`, `..` and symlinks. Before a
//! component is appended, the prefix it is appended to must be traversable.
//! Symlinks are substituted into the unresolved tail and walked again. Once
//! the tail is exhausted the final target is checked with the requested mode.
//!
//! Nothing is cached: every decision is made on a fresh query, so the result
//! reflects the tree as it was while the walk ran and nothing more.

use std::ffi::{OsStr, OsString};
use std::io;
use std::ops::Range;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::config::AccessPolicy;
use crate::error::{AccessError, AccessResult};
use crate::metadata::MetadataSource;
use crate::permission::check_permission;
use crate::types::{AccessMode, FileMetadata, Principal};

const SEPARATOR: u8 = b'/';

fn as_path(bytes: &[u8]) -> &Path {
    Path::new(OsStr::from_bytes(bytes))
}

/// Lexically clean an absolute path: collapse separators, drop `.` and fold
/// `..` into the preceding component. `..` never climbs above the root.
///
/// A trailing `/` or `/.` is kept as a trailing separator so the last
/// component must still turn out to be a directory.
pub(crate) fn clean(path: &[u8]) -> Vec<u8> {
    let mut out = vec![SEPARATOR];
    for component in path.split(|b| *b == SEPARATOR) {
        match component {
            b"" | b"." => {}
            b".." => pop_component(&mut out),
            _ => push_component(&mut out, component),
        }
    }
    let wants_dir = path.ends_with(b"/") || path.ends_with(b"/.");
    if wants_dir && out.len() > 1 {
        out.push(SEPARATOR);
    }
    out
}

fn push_component(path: &mut Vec<u8>, component: &[u8]) {
    if path.last() != Some(&SEPARATOR) {
        path.push(SEPARATOR);
    }
    path.extend_from_slice(component);
}

fn pop_component(path: &mut Vec<u8>) {
    match path.iter().rposition(|b| *b == SEPARATOR) {
        Some(0) | None => path.truncate(1),
        Some(idx) => path.truncate(idx),
    }
}

/// Mutable state of a single walk. Created and dropped inside one call.
#[derive(Debug)]
struct WalkState {
    /// Absolute, `.`/`..`-free, symlink-free path resolved so far
    resolved: Vec<u8>,
    /// Unresolved tail; may hold `.`, `..` and substituted link targets
    remaining: Vec<u8>,
    /// Read position in `remaining`
    cursor: usize,
    links_followed: u32,
}

impl WalkState {
    fn new(path: Vec<u8>) -> Self {
        Self {
            resolved: vec![SEPARATOR],
            remaining: path,
            cursor: 0,
            links_followed: 0,
        }
    }

    /// Advance past the next component and return its range in `remaining`.
    fn next_component(&mut self) -> Option<Range<usize>> {
        let tail = &self.remaining[self.cursor..];
        let start = self.cursor + tail.iter().position(|b| *b != SEPARATOR)?;
        let end = self.remaining[start..]
            .iter()
            .position(|b| *b == SEPARATOR)
            .map_or(self.remaining.len(), |len| start + len);
        self.cursor = end;
        Some(start..end)
    }

    /// Anything, even a lone separator, left after the current component.
    fn has_more(&self) -> bool {
        self.cursor < self.remaining.len()
    }

    fn resolved_path(&self) -> &Path {
        as_path(&self.resolved)
    }

    fn push(&mut self, range: Range<usize>) {
        push_component(&mut self.resolved, &self.remaining[range]);
    }

    fn pop(&mut self) {
        pop_component(&mut self.resolved);
    }

    /// Replace the link just appended to `resolved` with its target.
    fn substitute(&mut self, target: &[u8]) {
        let mut remaining = Vec::with_capacity(target.len() + self.remaining.len() - self.cursor);
        remaining.extend_from_slice(target);
        remaining.extend_from_slice(&self.remaining[self.cursor..]);

        if target.first() == Some(&SEPARATOR) {
            self.resolved.truncate(1);
        } else {
            self.pop();
        }
        self.remaining = remaining;
        self.cursor = 0;
    }
}

/// Resolves paths for one principal against one metadata source.
pub(crate) struct Walker<'a, M: ?Sized> {
    metadata: &'a M,
    principal: &'a Principal,
    policy: &'a AccessPolicy,
}

impl<'a, M: MetadataSource + ?Sized> Walker<'a, M> {
    pub(crate) fn new(metadata: &'a M, principal: &'a Principal, policy: &'a AccessPolicy) -> Self {
        Self {
            metadata,
            principal,
            policy,
        }
    }

    /// Walk `path` and check `wanted` on whatever it resolves to.
    ///
    /// Returns the canonical path on success. The first failure ends the walk;
    /// there is no partial result.
    pub(crate) fn resolve(&self, path: &Path, wanted: AccessMode) -> AccessResult<PathBuf> {
        let absolute = self.absolutize(path)?;
        let mut state = WalkState::new(clean(absolute.as_os_str().as_bytes()));

        while let Some(range) = state.next_component() {
            let component = &state.remaining[range.clone()];
            if component == b"." {
                continue;
            }
            if component == b".." {
                state.pop();
                continue;
            }

            self.check_traverse(state.resolved_path())?;
            state.push(range);

            let current = state.resolved_path();
            let meta = self.metadata.lstat(current)?;
            trace!(path = %current.display(), kind = ?meta.kind, "Walked component");

            if meta.is_symlink() {
                self.follow_link(&mut state, &meta)?;
                continue;
            }

            if !meta.is_dir() && state.has_more() {
                return Err(AccessError::NotADirectory {
                    path: current.to_path_buf(),
                });
            }
        }

        self.check_target(state.resolved_path(), wanted)?;
        Ok(PathBuf::from(OsString::from_vec(state.resolved)))
    }

    fn absolutize(&self, path: &Path) -> AccessResult<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(io::Error::from_raw_os_error(libc::ENOENT).into());
        }
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let base = match &self.policy.base_dir {
            Some(dir) => dir.clone(),
            None => self.metadata.current_dir()?,
        };
        Ok(base.join(path))
    }

    /// Execute check on a directory that is about to be descended into.
    /// The root is never checked.
    fn check_traverse(&self, dir: &Path) -> AccessResult<()> {
        if dir == Path::new("/") {
            return Ok(());
        }
        let meta = self.metadata.lstat(dir)?;
        check_permission(self.principal, AccessMode::EXECUTE, dir, &meta)
    }

    fn follow_link(&self, state: &mut WalkState, meta: &FileMetadata) -> AccessResult<()> {
        state.links_followed += 1;
        let link = state.resolved_path();
        check_permission(self.principal, AccessMode::EXECUTE, link, meta)?;

        if state.links_followed > self.policy.max_symlinks {
            return Err(AccessError::TooManyLinks {
                path: link.to_path_buf(),
            });
        }

        let target = self.metadata.read_link(link)?;
        trace!(
            link = %link.display(),
            target = %target.display(),
            followed = state.links_followed,
            "Following symlink"
        );
        state.substitute(target.as_os_str().as_bytes());
        Ok(())
    }

    /// Requested mode on the target, then execute on every ancestor below the
    /// root. The root itself is only checked when it is the target.
    fn check_target(&self, target: &Path, wanted: AccessMode) -> AccessResult<()> {
        let meta = self.metadata.lstat(target)?;
        check_permission(self.principal, wanted, target, &meta)?;

        for ancestor in target.ancestors().skip(1) {
            if ancestor.parent().is_none() {
                break;
            }
            let meta = self.metadata.lstat(ancestor)?;
            check_permission(self.principal, AccessMode::EXECUTE, ancestor, &meta)?;
        }
        Ok(())
    }
}
