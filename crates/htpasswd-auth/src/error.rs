//! Error types for password parsing and htpasswd tables.

use std::io;
use std::path::PathBuf;

/// Error produced when an encoded password cannot be turned into a verifier.
///
/// None of the variants carry password material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The encoding claims a scheme but violates its grammar.
    #[error("malformed {scheme} password: {reason}")]
    Malformed {
        scheme: &'static str,
        reason: &'static str,
    },

    /// The scheme is recognized but refused by policy.
    #[error("{scheme} passwords are rejected")]
    Rejected { scheme: &'static str },

    /// No parser in the chain claimed the encoding.
    #[error("unrecognized password format")]
    Unrecognized,
}

impl ParseError {
    #[inline]
    pub(crate) fn malformed(scheme: &'static str, reason: &'static str) -> Self {
        Self::Malformed { scheme, reason }
    }
}

/// A password system name that is not built in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown password system: {0}")]
pub struct UnknownSystem(pub String);

/// Error loading or reloading an htpasswd or group file.
#[derive(Debug, thiserror::Error)]
pub enum HtpasswdError {
    /// Opening the file failed.
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading lines failed.
    #[error("read error: {0}")]
    Read(#[from] io::Error),

    /// A non-comment line has no `:` separator.
    #[error("line {line}: malformed line, no colon")]
    MissingColon { line: usize },

    /// The password encoding of a user could not be parsed.
    #[error("line {line}: user {user}: {source}")]
    Parse {
        line: usize,
        user: String,
        #[source]
        source: ParseError,
    },

    /// `reload()` was called on a table that was not built from a file.
    #[error("no file path to reload from")]
    NoPath,
}
