//! `{SHA}` and `{SSHA}` encodings (base64 SHA-1, optionally salted).

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha1::{Digest, Sha1};

use crate::consteq::constant_time_eq;
use crate::encoded::{EncodedPassword, Parsed, reject_prefixed};
use crate::error::ParseError;

pub const PREFIX_SHA: &str = "{SHA}";
pub const PREFIX_SSHA: &str = "{SSHA}";

const SHA1_LEN: usize = 20;

/// `{SHA}base64(sha1(password))`, as written by `htpasswd -s`.
pub struct Sha {
    hash: Vec<u8>,
}

impl std::fmt::Debug for Sha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha").finish_non_exhaustive()
    }
}

impl EncodedPassword for Sha {
    fn matches(&self, password: &str) -> bool {
        constant_time_eq(&Sha1::digest(password.as_bytes()), &self.hash)
    }

    fn scheme(&self) -> &'static str {
        "sha"
    }
}

/// Parser for `{SHA}` encodings.
pub fn sha(encoded: &str) -> Parsed {
    let Some(rest) = encoded.strip_prefix(PREFIX_SHA) else {
        return Parsed::Decline;
    };
    match STANDARD.decode(rest) {
        Ok(hash) if hash.len() == SHA1_LEN => Parsed::matched(Sha { hash }),
        Ok(_) => Parsed::Invalid(ParseError::malformed("sha", "digest is not 20 bytes")),
        Err(_) => Parsed::Invalid(ParseError::malformed("sha", "invalid base64")),
    }
}

/// Refuse unsalted `{SHA}` records.
pub fn reject_sha(encoded: &str) -> Parsed {
    reject_prefixed(encoded, &[PREFIX_SHA], "sha")
}

/// `{SSHA}base64(sha1(password ‖ salt) ‖ salt)`, as used by LDAP servers.
pub struct Ssha {
    hash: Vec<u8>,
    salt: Vec<u8>,
}

impl std::fmt::Debug for Ssha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ssha").finish_non_exhaustive()
    }
}

impl EncodedPassword for Ssha {
    fn matches(&self, password: &str) -> bool {
        let computed = Sha1::new()
            .chain_update(password.as_bytes())
            .chain_update(&self.salt)
            .finalize();
        constant_time_eq(&computed, &self.hash)
    }

    fn scheme(&self) -> &'static str {
        "ssha"
    }
}

/// Parser for `{SSHA}` encodings.
pub fn ssha(encoded: &str) -> Parsed {
    let Some(rest) = encoded.strip_prefix(PREFIX_SSHA) else {
        return Parsed::Decline;
    };
    let Ok(mut decoded) = STANDARD.decode(rest) else {
        return Parsed::Invalid(ParseError::malformed("ssha", "invalid base64"));
    };
    if decoded.len() < SHA1_LEN {
        return Parsed::Invalid(ParseError::malformed("ssha", "digest is shorter than 20 bytes"));
    }
    let salt = decoded.split_off(SHA1_LEN);
    Parsed::matched(Ssha {
        hash: decoded,
        salt,
    })
}

/// Refuse `{SSHA}` records.
pub fn reject_ssha(encoded: &str) -> Parsed {
    reject_prefixed(encoded, &[PREFIX_SSHA], "ssha")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier(parsed: Parsed) -> Box<dyn EncodedPassword> {
        match parsed {
            Parsed::Match(v) => v,
            other => panic!("expected a verifier, got {other:?}"),
        }
    }

    #[test]
    fn sha_matches() {
        // htpasswd -nbs user password
        let v = verifier(sha("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g="));
        assert!(v.matches("password"));
        assert!(!v.matches("Password"));
        assert_eq!(v.scheme(), "sha");
    }

    #[test]
    fn sha_malformed() {
        assert!(matches!(sha("{SHA}!!!"), Parsed::Invalid(_)));
        assert!(matches!(sha("{SHA}AAAA"), Parsed::Invalid(_)));
        assert!(matches!(sha("{SSHA}AAAA"), Parsed::Decline));
        assert!(matches!(sha("plain"), Parsed::Decline));
    }

    #[test]
    fn ssha_matches() {
        let v = verifier(ssha("{SSHA}/lLSOXpMWipWr3ifiighLCpqBiFoMzBM"));
        assert!(v.matches("password"));
        assert!(!v.matches("password1"));
        assert_eq!(v.scheme(), "ssha");
    }

    #[test]
    fn ssha_malformed_and_declined() {
        assert!(matches!(ssha("{SSHA}0"), Parsed::Invalid(_)));
        assert!(matches!(ssha("{SSHA}AAAA"), Parsed::Invalid(_)));
        assert!(matches!(ssha("plaintext"), Parsed::Decline));
        assert!(matches!(ssha("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g="), Parsed::Decline));
    }

    #[test]
    fn rejected_by_prefix() {
        assert!(matches!(
            reject_ssha("{SSHA}0"),
            Parsed::Invalid(ParseError::Rejected { scheme: "ssha" })
        ));
        assert!(matches!(reject_ssha("plaintext"), Parsed::Decline));
        assert!(matches!(reject_ssha("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g="), Parsed::Decline));

        assert!(matches!(
            reject_sha("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g="),
            Parsed::Invalid(ParseError::Rejected { scheme: "sha" })
        ));
        assert!(matches!(reject_sha("{SSHA}0"), Parsed::Decline));
        assert!(matches!(reject_sha("plaintext"), Parsed::Decline));
    }
}
