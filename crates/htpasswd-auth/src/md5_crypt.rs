//! MD5-crypt (`$1$`) and its Apache variant APR1 (`$apr1$`).
//!
//! The two differ only in the magic string mixed into the digest.
//! Rounds are fixed at 1000 and the salt is at most 8 bytes.

use std::fmt;

use md5::{Digest, Md5};

use crate::consteq::constant_time_eq;
use crate::crypt64::{self, Layout};
use crate::encoded::{EncodedPassword, Parsed, reject_prefixed};
use crate::error::ParseError;

pub const PREFIX_APR1: &str = "$apr1$";
pub const PREFIX_MD5: &str = "$1$";

pub const SALT_MAX_LEN: usize = 8;
const ROUNDS: u32 = 1000;
const SCHEME: &str = "md5-crypt";

static MD5_LAYOUT: Layout = Layout {
    groups: &[[0, 6, 12], [1, 7, 13], [2, 8, 14], [3, 9, 15], [4, 10, 5]],
    tail: &[11],
};

/// A parsed `$apr1$` / `$1$` record.
#[derive(Clone)]
pub struct Md5Crypt {
    magic: &'static str,
    salt: String,
    hash: Vec<u8>,
}

impl Md5Crypt {
    /// Parse an encoded md5-crypt password, `Ok(None)` if the prefix does not match.
    pub fn parse(encoded: &str) -> Result<Option<Self>, ParseError> {
        let (magic, rest) = if let Some(rest) = encoded.strip_prefix(PREFIX_APR1) {
            (PREFIX_APR1, rest)
        } else if let Some(rest) = encoded.strip_prefix(PREFIX_MD5) {
            (PREFIX_MD5, rest)
        } else {
            return Ok(None);
        };

        let (salt, hash) = rest
            .split_once('$')
            .ok_or(ParseError::malformed(SCHEME, "no salt"))?;
        let hash = crypt64::decode(hash, &MD5_LAYOUT)
            .map_err(|e| ParseError::malformed(SCHEME, e.reason()))?;

        Ok(Some(Self {
            magic,
            salt: crypt64::salt_text(salt, SALT_MAX_LEN).to_owned(),
            hash,
        }))
    }

    /// Hash `password` with the APR1 magic, as Apache's `htpasswd -m` does.
    pub fn apr1(password: &str, salt: &str) -> Self {
        Self::with_magic(PREFIX_APR1, password, salt)
    }

    /// Hash `password` with the classic `$1$` magic.
    pub fn md5(password: &str, salt: &str) -> Self {
        Self::with_magic(PREFIX_MD5, password, salt)
    }

    fn with_magic(magic: &'static str, password: &str, salt: &str) -> Self {
        let salt = crypt64::salt_text(salt, SALT_MAX_LEN).to_owned();
        let hash = digest(password.as_bytes(), magic.as_bytes(), salt_bytes(&salt));
        Self { magic, salt, hash }
    }
}

impl fmt::Display for Md5Crypt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}${}",
            self.magic,
            self.salt,
            crypt64::encode(&self.hash, &MD5_LAYOUT)
        )
    }
}

impl fmt::Debug for Md5Crypt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Md5Crypt")
            .field("magic", &self.magic)
            .finish_non_exhaustive()
    }
}

impl EncodedPassword for Md5Crypt {
    fn matches(&self, password: &str) -> bool {
        let computed = digest(
            password.as_bytes(),
            self.magic.as_bytes(),
            salt_bytes(&self.salt),
        );
        constant_time_eq(&computed, &self.hash)
    }

    fn scheme(&self) -> &'static str {
        if self.magic == PREFIX_APR1 { "apr1" } else { "md5-crypt" }
    }
}

/// Parser for `$apr1$` and `$1$` encodings.
pub fn md5_crypt(encoded: &str) -> Parsed {
    Md5Crypt::parse(encoded).into()
}

/// Refuse `$apr1$` and `$1$` records.
pub fn reject_md5(encoded: &str) -> Parsed {
    reject_prefixed(encoded, &[PREFIX_APR1, PREFIX_MD5], "md5")
}

#[inline]
fn salt_bytes(salt: &str) -> &[u8] {
    crypt64::salt_bytes(salt, SALT_MAX_LEN)
}

fn digest(password: &[u8], magic: &[u8], salt: &[u8]) -> Vec<u8> {
    let alt = Md5::new()
        .chain_update(password)
        .chain_update(salt)
        .chain_update(password)
        .finalize();

    let mut ctx = Md5::new();
    ctx.update(password);
    ctx.update(magic);
    ctx.update(salt);
    ctx.update(crypt64::cycle(&alt, password.len()));
    let mut n = password.len();
    while n > 0 {
        if n & 1 != 0 {
            ctx.update([0u8]);
        } else {
            ctx.update(&password[..1]);
        }
        n >>= 1;
    }
    let mut fin = ctx.finalize().to_vec();

    for i in 0..ROUNDS {
        let mut ctx = Md5::new();
        if i & 1 != 0 {
            ctx.update(password);
        } else {
            ctx.update(&fin);
        }
        if i % 3 != 0 {
            ctx.update(salt);
        }
        if i % 7 != 0 {
            ctx.update(password);
        }
        if i & 1 != 0 {
            ctx.update(&fin);
        } else {
            ctx.update(password);
        }
        fin.copy_from_slice(&ctx.finalize());
    }
    fin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apr1_vector() {
        let record = Md5Crypt::parse("$apr1$VfoHyKyF$EQ3gDdg7EUQB69/ppHOOU0")
            .unwrap()
            .unwrap();
        assert!(record.matches("password"));
        assert!(!record.matches("passwore"));
        assert_eq!(record.scheme(), "apr1");
    }

    #[test]
    fn md5_vector() {
        let record = Md5Crypt::parse("$1$saltsalt$qjXMvbEw8oaL.CzflDtaK/")
            .unwrap()
            .unwrap();
        assert!(record.matches("password"));
        assert!(!record.matches(""));
        assert_eq!(record.scheme(), "md5-crypt");
    }

    #[test]
    fn hash_then_parse() {
        let encoded = Md5Crypt::apr1("hunter2", "abcdefgh").to_string();
        assert!(encoded.starts_with("$apr1$abcdefgh$"));
        let record = Md5Crypt::parse(&encoded).unwrap().unwrap();
        assert!(record.matches("hunter2"));
        assert_eq!(record.to_string(), encoded);

        let record = Md5Crypt::md5("", "toolongsalt");
        assert!(record.to_string().starts_with("$1$toolongs$"));
        assert!(record.matches(""));
    }

    #[test]
    fn multibyte_salt_survives_reencoding() {
        // the 8-byte cut lands inside 'ü'
        let encoded = Md5Crypt::apr1("pw", "abcdefgüh").to_string();
        assert!(encoded.starts_with("$apr1$abcdefgü$"));
        let record = Md5Crypt::parse(&encoded).unwrap().unwrap();
        assert!(record.matches("pw"));
        assert_eq!(record.to_string(), encoded);
    }

    #[test]
    fn malformed_and_declined() {
        assert!(matches!(md5_crypt("$apr1$nosalt"), Parsed::Invalid(_)));
        assert!(matches!(md5_crypt("$1$salt$short"), Parsed::Invalid(_)));
        assert!(matches!(md5_crypt("$5$salt$hash"), Parsed::Decline));
        assert!(matches!(md5_crypt("plain"), Parsed::Decline));
    }

    #[test]
    fn reject_md5_by_prefix() {
        for encoded in ["$apr1$VfoHyKyF$EQ3gDdg7EUQB69/ppHOOU0", "$1$broken"] {
            assert!(matches!(
                reject_md5(encoded),
                Parsed::Invalid(ParseError::Rejected { scheme: "md5" })
            ));
        }
        assert!(matches!(reject_md5("$5$salt$hash"), Parsed::Decline));
        assert!(matches!(reject_md5("plain"), Parsed::Decline));
    }
}
