//! Plain-text passwords.
//!
//! [`plain`] accepts any encoding, so it must be the last parser in a chain.
//! [`reject_plain`] takes its place when plain-text records must not load.

use crate::consteq::constant_time_eq;
use crate::encoded::{EncodedPassword, Parsed};
use crate::error::ParseError;

/// nginx writes plain passwords with this prefix.
const NGINX_PREFIX: &str = "{PLAIN}";

pub struct Plain {
    password: String,
}

impl std::fmt::Debug for Plain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plain").finish_non_exhaustive()
    }
}

impl EncodedPassword for Plain {
    fn matches(&self, password: &str) -> bool {
        // `{PLAIN}` is not stripped at parse time: it may be part of the password.
        let stored = self.password.as_bytes();
        let bare = constant_time_eq(password.as_bytes(), stored);
        let prefixed = constant_time_eq(format!("{NGINX_PREFIX}{password}").as_bytes(), stored);
        bare | prefixed
    }

    fn scheme(&self) -> &'static str {
        "plain"
    }
}

/// Accept any encoding as a plain-text password.
pub fn plain(encoded: &str) -> Parsed {
    Parsed::matched(Plain {
        password: encoded.to_owned(),
    })
}

/// Refuse every encoding that reaches it.
pub fn reject_plain(_encoded: &str) -> Parsed {
    Parsed::Invalid(ParseError::Rejected { scheme: "plain" })
}
