//! bcrypt encodings (`$2a$`, `$2b$`, `$2x$`, `$2y$`).
//!
//! Structure is validated here; the digest itself is delegated to the
//! `bcrypt` crate.

use crate::crypt64::is_crypt_char;
use crate::encoded::{EncodedPassword, Parsed, reject_prefixed};
use crate::error::ParseError;

const PREFIX: &str = "$2";
const SCHEME: &str = "bcrypt";
/// 22 chars of salt followed by 31 chars of digest.
const BODY_LEN: usize = 53;

/// A structurally valid bcrypt record.
pub struct Bcrypt {
    hash: String,
    cost: u32,
}

impl Bcrypt {
    /// The work factor of the record.
    #[inline]
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl std::fmt::Debug for Bcrypt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bcrypt")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl EncodedPassword for Bcrypt {
    fn matches(&self, password: &str) -> bool {
        ::bcrypt::verify(password, &self.hash).unwrap_or(false)
    }

    fn scheme(&self) -> &'static str {
        SCHEME
    }
}

/// Parser for bcrypt encodings.
pub fn bcrypt(encoded: &str) -> Parsed {
    let Some(rest) = encoded.strip_prefix(PREFIX) else {
        return Parsed::Decline;
    };
    match parse_cost(rest) {
        Ok(cost) => Parsed::matched(Bcrypt {
            hash: encoded.to_owned(),
            cost,
        }),
        Err(reason) => Parsed::Invalid(ParseError::malformed(SCHEME, reason)),
    }
}

/// Refuse every encoding [`bcrypt`] would claim.
pub fn reject_bcrypt(encoded: &str) -> Parsed {
    reject_prefixed(encoded, &[PREFIX], SCHEME)
}

/// Validate `<v>$<cost>$<53 chars>` and return the cost.
fn parse_cost(rest: &str) -> Result<u32, &'static str> {
    let mut parts = rest.splitn(3, '$');
    let version = parts.next().unwrap_or_default();
    if !matches!(version, "a" | "b" | "x" | "y") {
        return Err("unknown version");
    }
    let cost = parts.next().ok_or("missing cost")?;
    if cost.len() != 2 || !cost.bytes().all(|b| b.is_ascii_digit()) {
        return Err("cost is not two digits");
    }
    let cost: u32 = cost.parse().map_err(|_| "cost is not two digits")?;
    if !(4..=31).contains(&cost) {
        return Err("cost out of range");
    }
    let body = parts.next().ok_or("missing salt and hash")?;
    if body.len() != BODY_LEN || !body.bytes().all(is_crypt_char) {
        return Err("salt and hash must be 53 base64 characters");
    }
    Ok(cost)
}
