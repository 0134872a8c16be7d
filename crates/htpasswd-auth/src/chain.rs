//! Ordered parser chain.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::encoded::{EncodedPassword, Parsed, PasswdParser};
use crate::error::{ParseError, UnknownSystem};
use crate::{bcrypt, crypt_sha, md5_crypt, plain, sha};

/// A built-in password scheme, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum System {
    /// `$apr1$` and `$1$`.
    Md5,
    /// `{SHA}`.
    Sha,
    /// `$2a$`, `$2b$`, `$2x$`, `$2y$`.
    Bcrypt,
    /// `{SSHA}`.
    Ssha,
    /// `$5$` and `$6$`.
    CryptSha,
    /// Anything, as plain text. Must be last.
    Plain,
    /// Anything, refused. Must be last.
    RejectPlain,
    /// `$apr1$` and `$1$`, refused.
    RejectMd5,
    /// `{SHA}`, refused.
    RejectSha,
    /// bcrypt, refused.
    RejectBcrypt,
    /// `{SSHA}`, refused.
    RejectSsha,
    /// `$5$` and `$6$`, refused.
    RejectCryptSha,
}

impl System {
    /// Every built-in system.
    pub const ALL: [System; 12] = [
        System::Md5,
        System::Sha,
        System::Bcrypt,
        System::Ssha,
        System::CryptSha,
        System::Plain,
        System::RejectPlain,
        System::RejectMd5,
        System::RejectSha,
        System::RejectBcrypt,
        System::RejectSsha,
        System::RejectCryptSha,
    ];

    /// All built-in systems in default order, with plain text accepted.
    pub const DEFAULT: [System; 6] = [
        System::Md5,
        System::Sha,
        System::Bcrypt,
        System::Ssha,
        System::CryptSha,
        System::Plain,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha => "sha",
            Self::Bcrypt => "bcrypt",
            Self::Ssha => "ssha",
            Self::CryptSha => "crypt-sha",
            Self::Plain => "plain",
            Self::RejectPlain => "reject-plain",
            Self::RejectMd5 => "reject-md5",
            Self::RejectSha => "reject-sha",
            Self::RejectBcrypt => "reject-bcrypt",
            Self::RejectSsha => "reject-ssha",
            Self::RejectCryptSha => "reject-crypt-sha",
        }
    }

    /// Whether this system claims every input, making later systems unreachable.
    pub const fn is_catch_all(self) -> bool {
        matches!(self, Self::Plain | Self::RejectPlain)
    }

    /// The system whose records this one refuses, for the `reject-*` systems.
    pub const fn refuses(self) -> Option<System> {
        match self {
            Self::RejectPlain => Some(Self::Plain),
            Self::RejectMd5 => Some(Self::Md5),
            Self::RejectSha => Some(Self::Sha),
            Self::RejectBcrypt => Some(Self::Bcrypt),
            Self::RejectSsha => Some(Self::Ssha),
            Self::RejectCryptSha => Some(Self::CryptSha),
            _ => None,
        }
    }

    fn parser(self) -> fn(&str) -> Parsed {
        match self {
            Self::Md5 => md5_crypt::md5_crypt,
            Self::Sha => sha::sha,
            Self::Bcrypt => bcrypt::bcrypt,
            Self::Ssha => sha::ssha,
            Self::CryptSha => crypt_sha::crypt_sha,
            Self::Plain => plain::plain,
            Self::RejectPlain => plain::reject_plain,
            Self::RejectMd5 => md5_crypt::reject_md5,
            Self::RejectSha => sha::reject_sha,
            Self::RejectBcrypt => bcrypt::reject_bcrypt,
            Self::RejectSsha => sha::reject_ssha,
            Self::RejectCryptSha => crypt_sha::reject_crypt_sha,
        }
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of parsers; the first to claim an encoding wins.
///
/// Cloning is cheap: parsers are shared.
#[derive(Clone)]
pub struct ParserChain {
    parsers: Vec<Arc<dyn PasswdParser>>,
}

impl ParserChain {
    /// An empty chain. Every encoding is unrecognized until parsers are pushed.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Build a chain from built-in systems, keeping their order.
    pub fn from_systems<I>(systems: I) -> Self
    where
        I: IntoIterator<Item = System>,
    {
        let mut chain = Self::new();
        for system in systems {
            chain = chain.with(system.parser());
        }
        chain
    }

    /// Append a parser to the end of the chain.
    pub fn with<P: PasswdParser + 'static>(mut self, parser: P) -> Self {
        self.parsers.push(Arc::new(parser));
        self
    }

    /// Number of parsers in the chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Turn an encoded password into a verifier.
    ///
    /// Parsers run in order. The first `Match` is returned, the first
    /// `Invalid` stops the chain, and if every parser declines the result
    /// is [`ParseError::Unrecognized`].
    pub fn parse(&self, encoded: &str) -> Result<Box<dyn EncodedPassword>, ParseError> {
        for parser in &self.parsers {
            match parser.parse(encoded) {
                Parsed::Match(v) => return Ok(v),
                Parsed::Invalid(e) => return Err(e),
                Parsed::Decline => {}
            }
        }
        Err(ParseError::Unrecognized)
    }
}

impl Default for ParserChain {
    /// md5, sha, bcrypt, ssha, crypt-sha, then plain.
    fn default() -> Self {
        Self::from_systems(System::DEFAULT)
    }
}

impl FromStr for System {
    type Err = UnknownSystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|system| system.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSystem(s.to_owned()))
    }
}

// Cannot derive Debug due to dyn PasswdParser
impl fmt::Debug for ParserChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserChain")
            .field("len", &self.parsers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::plain::plain;

    #[derive(Debug)]
    struct Fixed(&'static str);

    impl EncodedPassword for Fixed {
        fn matches(&self, password: &str) -> bool {
            password == self.0
        }

        fn scheme(&self) -> &'static str {
            self.0
        }
    }

    fn declines(_: &str) -> Parsed {
        Parsed::Decline
    }

    fn errors(_: &str) -> Parsed {
        Parsed::Invalid(ParseError::malformed("a", "broken"))
    }

    fn matches_b(_: &str) -> Parsed {
        Parsed::matched(Fixed("b"))
    }

    #[test]
    fn first_match_after_decline_wins() {
        let chain = ParserChain::new().with(declines).with(matches_b);
        let v = chain.parse("anything").unwrap();
        assert_eq!(v.scheme(), "b");
    }

    #[test]
    fn error_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = calls.clone();
            move |_: &str| {
                calls.fetch_add(1, Ordering::SeqCst);
                Parsed::matched(Fixed("b"))
            }
        };
        let chain = ParserChain::new().with(errors).with(counted);
        assert_eq!(
            chain.parse("anything").unwrap_err(),
            ParseError::malformed("a", "broken")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_decline_is_unrecognized() {
        let chain = ParserChain::new().with(declines).with(declines);
        assert_eq!(chain.parse("x").unwrap_err(), ParseError::Unrecognized);
        assert_eq!(ParserChain::new().parse("x").unwrap_err(), ParseError::Unrecognized);
    }

    #[test]
    fn malformed_crypt_sha_never_reaches_plain() {
        let chain = ParserChain::default();
        match chain.parse("$5$nosalt") {
            Err(ParseError::Malformed { scheme, .. }) => assert_eq!(scheme, "crypt-sha"),
            other => panic!("expected malformed crypt-sha, got {other:?}"),
        }
    }

    #[test]
    fn default_chain_routes_by_prefix() {
        let chain = ParserChain::default();
        let cases = [
            ("$apr1$VfoHyKyF$EQ3gDdg7EUQB69/ppHOOU0", "apr1", "password"),
            ("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g=", "sha", "password"),
            ("{SSHA}/lLSOXpMWipWr3ifiighLCpqBiFoMzBM", "ssha", "password"),
            (
                "$5$123456$2hClNSDw3lZ0X/9PFBSI2eCGMOS06v6IbChiRsjy6tA",
                "crypt-sha256",
                "mickey",
            ),
            ("bar", "plain", "bar"),
        ];
        for (encoded, scheme, password) in cases {
            let v = chain.parse(encoded).unwrap();
            assert_eq!(v.scheme(), scheme);
            assert!(v.matches(password), "{encoded}");
        }
    }

    #[test]
    fn hardened_chain_rejects_plain() {
        let chain = ParserChain::from_systems([System::CryptSha, System::RejectPlain]);
        assert_eq!(
            chain.parse("bar").unwrap_err(),
            ParseError::Rejected { scheme: "plain" }
        );
        assert!(
            chain
                .parse("$5$123456$2hClNSDw3lZ0X/9PFBSI2eCGMOS06v6IbChiRsjy6tA")
                .is_ok()
        );
    }

    #[test]
    fn refusing_sha_does_not_fall_through_to_plain() {
        let chain = ParserChain::from_systems([
            System::RejectSha,
            System::Ssha,
            System::CryptSha,
            System::Plain,
        ]);
        assert_eq!(
            chain.parse("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g=").unwrap_err(),
            ParseError::Rejected { scheme: "sha" }
        );
        assert_eq!(
            chain.parse("{SSHA}/lLSOXpMWipWr3ifiighLCpqBiFoMzBM").unwrap().scheme(),
            "ssha"
        );
        assert_eq!(chain.parse("bar").unwrap().scheme(), "plain");
    }

    #[test]
    fn reject_systems_are_not_catch_alls() {
        for system in System::ALL {
            if system != System::RejectPlain && system.refuses().is_some() {
                assert!(!system.is_catch_all(), "{system}");
                let chain = ParserChain::from_systems([system]);
                assert_eq!(chain.parse("plaintext").unwrap_err(), ParseError::Unrecognized);
            }
        }
        assert_eq!(System::RejectCryptSha.refuses(), Some(System::CryptSha));
        assert_eq!(System::Plain.refuses(), None);
    }

    #[test]
    fn plain_first_swallows_everything() {
        let chain = ParserChain::new().with(plain).with(crypt_sha::crypt_sha);
        let v = chain.parse("$5$nosalt").unwrap();
        assert_eq!(v.scheme(), "plain");
    }

    #[test]
    fn system_names_parse_back() {
        for system in System::ALL {
            assert_eq!(system.to_string().parse::<System>(), Ok(system));
        }
        assert_eq!("Crypt-SHA".parse::<System>(), Ok(System::CryptSha));
        assert_eq!("reject-ssha".parse::<System>(), Ok(System::RejectSsha));
        assert_eq!(
            "des".parse::<System>(),
            Err(UnknownSystem("des".to_string()))
        );
    }
}
