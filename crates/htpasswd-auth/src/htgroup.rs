//! Apache group files.
//!
//! ```text
//! users: alice bob carol
//! admins: alice
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::HtpasswdError;
use crate::htpasswd::split_line;

type UserGroups = HashMap<String, Vec<String>>;

/// Group memberships keyed by user, reloadable like [`Htpasswd`](crate::Htpasswd).
pub struct HtGroup {
    path: Option<PathBuf>,
    groups: ArcSwap<UserGroups>,
}

impl HtGroup {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HtpasswdError> {
        let path = path.as_ref();
        let groups = load_file(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            groups: ArcSwap::new(Arc::new(groups)),
        })
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, HtpasswdError> {
        Ok(Self {
            path: None,
            groups: ArcSwap::new(Arc::new(build_groups(reader)?)),
        })
    }

    /// Re-read the group file; the current memberships stay on error.
    pub fn reload(&self) -> Result<(), HtpasswdError> {
        let path = self.path.as_deref().ok_or(HtpasswdError::NoPath)?;
        self.groups.store(Arc::new(load_file(path)?));
        Ok(())
    }

    pub fn reload_from_reader<R: BufRead>(&self, reader: R) -> Result<(), HtpasswdError> {
        self.groups.store(Arc::new(build_groups(reader)?));
        Ok(())
    }

    pub fn is_user_in_group(&self, user: &str, group: &str) -> bool {
        self.groups
            .load()
            .get(user)
            .is_some_and(|groups| groups.iter().any(|g| g == group))
    }

    /// Groups of `user` in file order, empty if the user is in none.
    pub fn user_groups(&self, user: &str) -> Vec<String> {
        self.groups.load().get(user).cloned().unwrap_or_default()
    }

    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::fmt::Debug for HtGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtGroup")
            .field("path", &self.path)
            .field("users", &self.groups.load().len())
            .finish()
    }
}

fn load_file(path: &Path) -> Result<UserGroups, HtpasswdError> {
    let file = File::open(path).map_err(|source| HtpasswdError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let groups = build_groups(BufReader::new(file))?;
    tracing::info!(path = %path.display(), users = groups.len(), "loaded group file");
    Ok(groups)
}

fn build_groups<R: BufRead>(reader: R) -> Result<UserGroups, HtpasswdError> {
    let mut groups = UserGroups::new();
    for (idx, raw) in reader.lines().enumerate() {
        let raw = raw?;
        let Some((group, users)) = split_line(&raw, idx + 1)? else {
            continue;
        };
        let group = group.trim();
        for user in users.split_whitespace() {
            groups
                .entry(user.to_owned())
                .or_default()
                .push(group.to_owned());
        }
    }
    Ok(groups)
}
