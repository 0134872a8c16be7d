//! Password hash recognition and htpasswd credential tables.
//!
//! An encoded password such as `$6$salt$hash` or `{SHA}...` is handed to a
//! [`ParserChain`]; the first parser that recognizes it returns an
//! [`EncodedPassword`] verifier. [`Htpasswd`] applies the chain to every line
//! of an Apache-style htpasswd file and keeps the result in a table that can
//! be reloaded while readers keep verifying.
//!
//! # Example
//!
//! ```
//! use htpasswd_auth::{EncodedPassword, ParseError, ParserChain};
//!
//! let chain = ParserChain::default();
//!
//! let v = chain.parse("$5$123456$2hClNSDw3lZ0X/9PFBSI2eCGMOS06v6IbChiRsjy6tA").unwrap();
//! assert_eq!(v.scheme(), "crypt-sha256");
//! assert!(v.matches("mickey"));
//!
//! // A claimed but broken record halts the chain before plain text sees it.
//! assert!(matches!(chain.parse("$5$nosalt"), Err(ParseError::Malformed { .. })));
//! ```

mod basic;
mod bcrypt;
mod chain;
mod consteq;
mod crypt64;
mod crypt_sha;
mod encoded;
mod error;
mod htgroup;
mod htpasswd;
mod md5_crypt;
mod plain;
mod sha;

#[cfg(feature = "cli")]
pub mod cli;

pub use basic::{Credentials, challenge};
pub use self::bcrypt::{Bcrypt, bcrypt, reject_bcrypt};
pub use chain::{ParserChain, System};
pub use crypt_sha::{
    CryptSha, ROUNDS_DEFAULT, ROUNDS_MAX, ROUNDS_MIN, ShaWidth, crypt_sha, generate_salt,
    reject_crypt_sha,
};
pub use encoded::{EncodedPassword, Parsed, PasswdParser};
pub use error::{HtpasswdError, ParseError, UnknownSystem};
pub use htgroup::HtGroup;
pub use htpasswd::{BadLinePolicy, Htpasswd, Options};
pub use md5_crypt::{Md5Crypt, md5_crypt, reject_md5};
pub use plain::{Plain, plain, reject_plain};
pub use sha::{Sha, Ssha, reject_sha, reject_ssha, sha, ssha};

#[cfg(feature = "cli")]
pub use cli::AuthArgs;
