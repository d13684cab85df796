// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Core type definitions for permission checks

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseAccessModeError;

bitflags::bitflags! {
    /// Access requested on a path.
    ///
    /// The bit values match one rwx triplet of a file mode, so a requested
    /// mode can be shifted straight into the owner (`<< 6`) or group (`<< 3`)
    /// position of a permission word.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AccessMode: u32 {
        const READ = 0o4;
        const WRITE = 0o2;
        const EXECUTE = 0o1;
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.contains(AccessMode::READ) { 'r' } else { '-' };
        let w = if self.contains(AccessMode::WRITE) { 'w' } else { '-' };
        let x = if self.contains(AccessMode::EXECUTE) { 'x' } else { '-' };
        write!(f, "{}{}{}", r, w, x)
    }
}

impl FromStr for AccessMode {
    type Err = ParseAccessModeError;

    /// Accepts a single octal digit (`"6"`) or any combination of the
    /// letters `r`, `w`, `x` and `-` (`"rw"`, `"r-x"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseAccessModeError {
            input: s.to_string(),
        };

        if s.len() == 1 {
            if let Some(digit) = s.chars().next().and_then(|c| c.to_digit(8)) {
                return Ok(AccessMode::from_bits_truncate(digit));
            }
        }
        if s.is_empty() {
            return Err(invalid());
        }

        let mut mode = AccessMode::empty();
        for c in s.chars() {
            match c {
                'r' => mode |= AccessMode::READ,
                'w' => mode |= AccessMode::WRITE,
                'x' => mode |= AccessMode::EXECUTE,
                '-' => {}
                _ => return Err(invalid()),
            }
        }
        Ok(mode)
    }
}

/// Kind of a filesystem node as reported by a non-following stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    Symlink,
    Regular,
    /// Devices, fifos, sockets
    Other,
}

/// Ownership and permission data for a single path component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMetadata {
    /// Mode bits without the file type (`st_mode & 0o7777`)
    pub mode: u32,
    pub kind: FileKind,
    pub uid: u32,
    pub gid: u32,
}

impl FileMetadata {
    pub fn new(kind: FileKind, mode: u32, uid: u32, gid: u32) -> Self {
        Self {
            mode: mode & 0o7777,
            kind,
            uid,
            gid,
        }
    }

    /// The nine owner/group/other rwx bits.
    pub fn permissions(&self) -> u32 {
        self.mode & 0o777
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }
}

/// The identity whose access is being checked.
///
/// `groups` always contains the primary group, so membership tests never have
/// to special-case it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    uid: u32,
    gid: u32,
    groups: BTreeSet<u32>,
}

impl Principal {
    pub fn new(uid: u32, gid: u32, supplementary: impl IntoIterator<Item = u32>) -> Self {
        let mut groups: BTreeSet<u32> = supplementary.into_iter().collect();
        groups.insert(gid);
        Self { uid, gid, groups }
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Primary group id
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Primary and supplementary group ids, ascending
    pub fn groups(&self) -> &BTreeSet<u32> {
        &self.groups
    }

    pub fn in_group(&self, gid: u32) -> bool {
        self.groups.contains(&gid)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uid {}, gid {:?}", self.uid, self.groups)
    }
}
