//! Hot-reloadable htpasswd credential table.
//!
//! The table maps usernames to verifiers. A reload parses the whole source
//! into a fresh map and publishes it with one atomic store, so readers see
//! either the old table or the new one, never a mix.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::chain::ParserChain;
use crate::encoded::EncodedPassword;
use crate::error::HtpasswdError;

type Table = HashMap<String, Box<dyn EncodedPassword>>;

/// What to do with a line that cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadLinePolicy {
    /// Fail the whole load; the previous table stays published.
    #[default]
    Abort,
    /// Log a warning and continue with the next line.
    Skip,
}

/// Options shared by every load of a table.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub chain: ParserChain,
    pub on_bad_line: BadLinePolicy,
}

impl Options {
    pub fn with_chain(mut self, chain: ParserChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn on_bad_line(mut self, policy: BadLinePolicy) -> Self {
        self.on_bad_line = policy;
        self
    }
}

/// An Apache-style htpasswd file held in memory.
///
/// # Example
/// ```
/// use htpasswd_auth::{Htpasswd, Options};
///
/// let data = "# admins\nalice:{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g=\nbob:hunter2\n";
/// let table = Htpasswd::from_reader(data.as_bytes(), Options::default()).unwrap();
///
/// assert!(table.matches("alice", "password"));
/// assert!(table.matches("bob", "hunter2"));
/// assert!(!table.matches("carol", "hunter2"));
/// ```
pub struct Htpasswd {
    path: Option<PathBuf>,
    options: Options,
    table: ArcSwap<Table>,
}

impl Htpasswd {
    /// Load a table from a file. [`reload`](Self::reload) re-reads the same path.
    pub fn open(path: impl AsRef<Path>, options: Options) -> Result<Self, HtpasswdError> {
        let path = path.as_ref();
        let table = load_file(path, &options)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            options,
            table: ArcSwap::new(Arc::new(table)),
        })
    }

    /// Load a table from any buffered reader.
    ///
    /// A table built this way has no path, so [`reload`](Self::reload)
    /// returns [`HtpasswdError::NoPath`]; use
    /// [`reload_from_reader`](Self::reload_from_reader) instead.
    pub fn from_reader<R: BufRead>(reader: R, options: Options) -> Result<Self, HtpasswdError> {
        let table = build_table(reader, &options)?;
        Ok(Self {
            path: None,
            options,
            table: ArcSwap::new(Arc::new(table)),
        })
    }

    /// Re-read the file this table was opened from.
    ///
    /// Returns the number of users in the new table. On error the current
    /// table is left untouched.
    pub fn reload(&self) -> Result<usize, HtpasswdError> {
        let path = self.path.as_deref().ok_or(HtpasswdError::NoPath)?;
        let table = load_file(path, &self.options)?;
        Ok(self.publish(table))
    }

    /// Replace the table with the records read from `reader`.
    pub fn reload_from_reader<R: BufRead>(&self, reader: R) -> Result<usize, HtpasswdError> {
        let table = build_table(reader, &self.options)?;
        Ok(self.publish(table))
    }

    /// Check a username and password against the current table.
    ///
    /// Verification can take many digest rounds, so this holds a full `Arc`
    /// of the table rather than an `arc_swap` guard.
    pub fn matches(&self, user: &str, password: &str) -> bool {
        let table = self.table.load_full();
        table.get(user).is_some_and(|v| v.matches(password))
    }

    #[inline]
    pub fn contains_user(&self, user: &str) -> bool {
        self.table.load().contains_key(user)
    }

    /// Number of users in the current table.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.load().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.load().is_empty()
    }

    /// Users and their password schemes, sorted by username.
    pub fn users(&self) -> Vec<(String, &'static str)> {
        let table = self.table.load();
        let mut users: Vec<_> = table
            .iter()
            .map(|(user, v)| (user.clone(), v.scheme()))
            .collect();
        users.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        users
    }

    /// The file this table was opened from, if any.
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn publish(&self, table: Table) -> usize {
        let users = table.len();
        self.table.store(Arc::new(table));
        users
    }
}

// Cannot derive Debug due to dyn EncodedPassword
impl std::fmt::Debug for Htpasswd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Htpasswd")
            .field("path", &self.path)
            .field("users", &self.len())
            .finish_non_exhaustive()
    }
}

/// Split a raw line into `(user, encoding)`.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub(crate) fn split_line(raw: &str, line: usize) -> Result<Option<(&str, &str)>, HtpasswdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    trimmed
        .split_once(':')
        .map(Some)
        .ok_or(HtpasswdError::MissingColon { line })
}

fn load_file(path: &Path, options: &Options) -> Result<Table, HtpasswdError> {
    let file = File::open(path).map_err(|source| HtpasswdError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = build_table(BufReader::new(file), options)?;
    tracing::info!(path = %path.display(), users = table.len(), "loaded htpasswd file");
    Ok(table)
}

fn build_table<R: BufRead>(reader: R, options: &Options) -> Result<Table, HtpasswdError> {
    let mut table = Table::new();
    let mut skipped = 0usize;

    for (idx, raw) in reader.lines().enumerate() {
        let raw = raw?;
        let line = idx + 1;
        let record = split_line(&raw, line).and_then(|record| match record {
            Some((user, encoding)) => options
                .chain
                .parse(encoding)
                .map(|v| Some((user, v)))
                .map_err(|source| HtpasswdError::Parse {
                    line,
                    user: user.to_owned(),
                    source,
                }),
            None => Ok(None),
        });

        match record {
            Ok(Some((user, verifier))) => {
                table.insert(user.to_owned(), verifier);
            }
            Ok(None) => {}
            Err(e) if options.on_bad_line == BadLinePolicy::Skip => {
                tracing::warn!(error = %e, "skipping htpasswd line");
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::debug!(users = table.len(), skipped, "parsed htpasswd records");
    Ok(table)
}
