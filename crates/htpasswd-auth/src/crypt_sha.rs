//! SHA-256 and SHA-512 crypt (`$5$` / `$6$`).
//!
//! The iterated salted digest popularized by glibc for Unix password files.
//!
//! # Hash Format
//!
//! ```text
//! $5$[rounds=N$]salt$hash      43-char hash
//! $6$[rounds=N$]salt$hash      86-char hash
//! ```
//!
//! * `rounds` defaults to 5000 and is clamped to `1000..=999_999_999`.
//! * `salt` is at most 16 bytes; longer salts are truncated. A multibyte
//!   character cut by the truncation stays in the encoding, but only its
//!   leading bytes reach the digest.
//! * `hash` uses the crypt alphabet `./0-9A-Za-z` with a scheme-specific
//!   byte order.

use std::fmt;

use rand::Rng;
use sha2::{Digest, Sha256, Sha512};

use crate::consteq::constant_time_eq;
use crate::crypt64::{self, ALPHABET, Layout};
use crate::encoded::{EncodedPassword, Parsed, reject_prefixed};
use crate::error::ParseError;

pub const PREFIX_SHA256: &str = "$5$";
pub const PREFIX_SHA512: &str = "$6$";

/// Rounds used when the encoding has no `rounds=` clause.
pub const ROUNDS_DEFAULT: u32 = 5000;
pub const ROUNDS_MIN: u32 = 1000;
pub const ROUNDS_MAX: u32 = 999_999_999;

/// Maximum salt length in bytes.
pub const SALT_MAX_LEN: usize = 16;

const ROUNDS_PREFIX: &str = "rounds=";
const SCHEME: &str = "crypt-sha";

static SHA256_LAYOUT: Layout = Layout {
    groups: &[
        [0, 10, 20],
        [21, 1, 11],
        [12, 22, 2],
        [3, 13, 23],
        [24, 4, 14],
        [15, 25, 5],
        [6, 16, 26],
        [27, 7, 17],
        [18, 28, 8],
        [9, 19, 29],
    ],
    tail: &[31, 30],
};

static SHA512_LAYOUT: Layout = Layout {
    groups: &[
        [0, 21, 42],
        [22, 43, 1],
        [44, 2, 23],
        [3, 24, 45],
        [25, 46, 4],
        [47, 5, 26],
        [6, 27, 48],
        [28, 49, 7],
        [50, 8, 29],
        [9, 30, 51],
        [31, 52, 10],
        [53, 11, 32],
        [12, 33, 54],
        [34, 55, 13],
        [56, 14, 35],
        [15, 36, 57],
        [37, 58, 16],
        [59, 17, 38],
        [18, 39, 60],
        [40, 61, 19],
        [62, 20, 41],
    ],
    tail: &[63],
};

/// Digest width of a crypt-sha record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaWidth {
    Sha256,
    Sha512,
}

impl ShaWidth {
    /// The `$5$` / `$6$` prefix.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Sha256 => PREFIX_SHA256,
            Self::Sha512 => PREFIX_SHA512,
        }
    }

    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Sha256 => "crypt-sha256",
            Self::Sha512 => "crypt-sha512",
        }
    }

    /// Raw digest length in bytes (32 or 64).
    pub const fn digest_len(self) -> usize {
        self.layout().digest_len()
    }

    /// Encoded hash length in characters (43 or 86).
    pub const fn encoded_len(self) -> usize {
        self.layout().encoded_len()
    }

    const fn layout(self) -> &'static Layout {
        match self {
            Self::Sha256 => &SHA256_LAYOUT,
            Self::Sha512 => &SHA512_LAYOUT,
        }
    }

    fn digest(self, password: &[u8], salt: &[u8], rounds: u32) -> Vec<u8> {
        match self {
            Self::Sha256 => sha_crypt::<Sha256>(password, salt, rounds),
            Self::Sha512 => sha_crypt::<Sha512>(password, salt, rounds),
        }
    }
}

/// A parsed `$5$` / `$6$` record.
#[derive(Clone)]
pub struct CryptSha {
    width: ShaWidth,
    rounds: u32,
    explicit_rounds: bool,
    salt: String,
    hash: Vec<u8>,
}

impl CryptSha {
    /// Parse an encoded crypt-sha password.
    ///
    /// Returns `Ok(None)` if the string does not start with `$5$` or `$6$`.
    /// Once the prefix matched, any structural problem is an error.
    pub fn parse(encoded: &str) -> Result<Option<Self>, ParseError> {
        let (width, rest) = if let Some(rest) = encoded.strip_prefix(PREFIX_SHA256) {
            (ShaWidth::Sha256, rest)
        } else if let Some(rest) = encoded.strip_prefix(PREFIX_SHA512) {
            (ShaWidth::Sha512, rest)
        } else {
            return Ok(None);
        };

        let (rounds, explicit_rounds, rest) = match rest.strip_prefix(ROUNDS_PREFIX) {
            Some(after) => {
                let (digits, rest) = after
                    .split_once('$')
                    .ok_or(ParseError::malformed(SCHEME, "rounds is not terminated by '$'"))?;
                (parse_rounds(digits)?, true, rest)
            }
            None => (ROUNDS_DEFAULT, false, rest),
        };

        let (salt, hash) = rest
            .split_once('$')
            .ok_or(ParseError::malformed(SCHEME, "no salt"))?;
        if salt.contains([':', '\n']) {
            return Err(ParseError::malformed(SCHEME, "salt contains ':' or newline"));
        }

        let hash = crypt64::decode(hash, width.layout())
            .map_err(|e| ParseError::malformed(SCHEME, e.reason()))?;

        Ok(Some(Self {
            width,
            rounds,
            explicit_rounds,
            salt: crypt64::salt_text(salt, SALT_MAX_LEN).to_owned(),
            hash,
        }))
    }

    /// Hash `password` into a new record.
    ///
    /// `rounds` of `None` uses the default and omits the `rounds=` clause from
    /// the encoding; `Some` is clamped and always written out.
    pub fn new(width: ShaWidth, password: &str, salt: &str, rounds: Option<u32>) -> Self {
        let (rounds, explicit_rounds) = match rounds {
            Some(r) => (r.clamp(ROUNDS_MIN, ROUNDS_MAX), true),
            None => (ROUNDS_DEFAULT, false),
        };
        let salt = crypt64::salt_text(salt, SALT_MAX_LEN).to_owned();
        let hash = width.digest(password.as_bytes(), salt_bytes(&salt), rounds);
        Self {
            width,
            rounds,
            explicit_rounds,
            salt,
            hash,
        }
    }

    #[inline]
    pub fn width(&self) -> ShaWidth {
        self.width
    }

    #[inline]
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Whether the encoding carried a `rounds=` clause.
    #[inline]
    pub fn has_explicit_rounds(&self) -> bool {
        self.explicit_rounds
    }
}

/// Canonical encoding of the record.
impl fmt::Display for CryptSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.width.prefix())?;
        if self.explicit_rounds {
            write!(f, "{ROUNDS_PREFIX}{}$", self.rounds)?;
        }
        write!(
            f,
            "{}${}",
            self.salt,
            crypt64::encode(&self.hash, self.width.layout())
        )
    }
}

// Keep salt and digest out of logs.
impl fmt::Debug for CryptSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptSha")
            .field("width", &self.width)
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}

impl EncodedPassword for CryptSha {
    fn matches(&self, password: &str) -> bool {
        let computed = self
            .width
            .digest(password.as_bytes(), salt_bytes(&self.salt), self.rounds);
        constant_time_eq(&computed, &self.hash)
    }

    fn scheme(&self) -> &'static str {
        self.width.scheme()
    }
}

/// Parser for `$5$` and `$6$` encodings.
pub fn crypt_sha(encoded: &str) -> Parsed {
    CryptSha::parse(encoded).into()
}

/// Refuse `$5$` and `$6$` records.
pub fn reject_crypt_sha(encoded: &str) -> Parsed {
    reject_prefixed(encoded, &[PREFIX_SHA256, PREFIX_SHA512], SCHEME)
}

/// Generate a random salt of [`SALT_MAX_LEN`] crypt-alphabet characters.
pub fn generate_salt() -> String {
    let mut rng = rand::rng();
    (0..SALT_MAX_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

fn parse_rounds(digits: &str) -> Result<u32, ParseError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::malformed(SCHEME, "rounds is not a decimal number"));
    }
    // Digits only, so the parse can only fail on overflow.
    let rounds = digits.parse::<u64>().unwrap_or(u64::MAX);
    let clamped = rounds.clamp(u64::from(ROUNDS_MIN), u64::from(ROUNDS_MAX));
    Ok(u32::try_from(clamped).unwrap_or(ROUNDS_MAX))
}

#[inline]
fn salt_bytes(salt: &str) -> &[u8] {
    crypt64::salt_bytes(salt, SALT_MAX_LEN)
}

/// Compute the raw (unpermuted) sha-crypt digest.
fn sha_crypt<D: Digest>(password: &[u8], salt: &[u8], rounds: u32) -> Vec<u8> {
    let pw_len = password.len();

    let b = D::new()
        .chain_update(password)
        .chain_update(salt)
        .chain_update(password)
        .finalize();

    let mut ctx = D::new();
    ctx.update(password);
    ctx.update(salt);
    ctx.update(crypt64::cycle(&b, pw_len));
    // Walk the bits of the password length, lowest first.
    let mut n = pw_len;
    while n > 0 {
        if n & 1 != 0 {
            ctx.update(&b);
        } else {
            ctx.update(password);
        }
        n >>= 1;
    }
    let a = ctx.finalize();

    let mut ctx = D::new();
    for _ in 0..pw_len {
        ctx.update(password);
    }
    let p = crypt64::cycle(&ctx.finalize(), pw_len);

    let mut ctx = D::new();
    for _ in 0..16 + usize::from(a[0]) {
        ctx.update(salt);
    }
    let s = crypt64::cycle(&ctx.finalize(), salt.len());

    let mut c = a.to_vec();
    for i in 0..rounds {
        let mut ctx = D::new();
        if i & 1 != 0 {
            ctx.update(&p);
        } else {
            ctx.update(&c);
        }
        if i % 3 != 0 {
            ctx.update(&s);
        }
        if i % 7 != 0 {
            ctx.update(&p);
        }
        if i & 1 != 0 {
            ctx.update(&c);
        } else {
            ctx.update(&p);
        }
        c.copy_from_slice(&ctx.finalize());
    }
    c
}
