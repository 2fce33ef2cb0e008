//! Session capabilities gating read, write and delete.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A capability granted to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// List and download files
    Read,
    /// Upload files
    Write,
    /// Delete files
    Delete,
}

impl Permission {
    /// Capability string as sent by the host.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Delete => "delete",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            "delete" => Ok(Permission::Delete),
            _ => Err(()),
        }
    }
}

/// Capabilities established once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    granted: BTreeSet<Permission>,
}

impl PermissionSet {
    /// Every capability.
    pub fn all() -> Self {
        [Permission::Read, Permission::Write, Permission::Delete]
            .into_iter()
            .collect()
    }

    /// No capabilities.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from capability strings. Unknown strings are ignored.
    pub fn from_strings<I, S>(perms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut granted = BTreeSet::new();
        for p in perms {
            let p = p.as_ref();
            match p.parse::<Permission>() {
                Ok(perm) => {
                    granted.insert(perm);
                }
                Err(()) if p.trim().is_empty() => {}
                Err(()) => debug!(permission = p, "ignoring unknown permission"),
            }
        }
        Self { granted }
    }

    /// Parse a comma-separated list such as `read,write`.
    pub fn parse_list(list: &str) -> Self {
        Self::from_strings(list.split(','))
    }

    /// Whether the capability is granted.
    pub fn has(&self, perm: Permission) -> bool {
        self.granted.contains(&perm)
    }

    pub fn can_read(&self) -> bool {
        self.has(Permission::Read)
    }

    pub fn can_write(&self) -> bool {
        self.has(Permission::Write)
    }

    pub fn can_delete(&self) -> bool {
        self.has(Permission::Delete)
    }

    /// Iterate over granted capabilities.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.granted.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            granted: iter.into_iter().collect(),
        }
    }
}
