//! HTTP Basic authentication helpers.
//!
//! These work on header values only; wiring them into a server is up to the
//! caller.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::htpasswd::Htpasswd;

const SCHEME: &str = "Basic";

/// Username and password taken from an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization` header value.
    ///
    /// The scheme name is matched case-insensitively. Returns `None` for other
    /// schemes, bad base64, non-UTF-8 payloads and payloads without a `:`.
    pub fn from_header(value: &str) -> Option<Self> {
        let (scheme, token) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case(SCHEME) {
            return None;
        }
        let decoded = STANDARD.decode(token.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':')?;
        Some(Self::new(user, password))
    }

    /// Encode as an `Authorization` header value.
    pub fn to_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.user, self.password));
        format!("{SCHEME} {token}")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// `WWW-Authenticate` value asking the client for Basic credentials.
pub fn challenge(realm: &str) -> String {
    let realm = realm.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{SCHEME} realm=\"{realm}\"")
}

impl Htpasswd {
    /// Authenticate an `Authorization` header value.
    ///
    /// Returns the username on success. Callers answer `None` with a 401 and
    /// a [`challenge`].
    pub fn authorize(&self, header: &str) -> Option<String> {
        let creds = Credentials::from_header(header)?;
        self.matches(&creds.user, &creds.password).then_some(creds.user)
    }
}
