//! Verifier and parser traits.

use std::fmt;

use crate::error::ParseError;

/// A parsed password encoding that can check candidate passwords.
///
/// Implementations are immutable after construction and must be thread-safe
/// (`Send + Sync`) since a table is shared by all readers. Parsed state (salt,
/// rounds, digest bytes) stays private.
pub trait EncodedPassword: Send + Sync + fmt::Debug {
    /// Returns true if `password` matches. Comparison is constant time with
    /// respect to the stored digest.
    fn matches(&self, password: &str) -> bool;

    /// Short scheme name, e.g. `"crypt-sha512"`.
    fn scheme(&self) -> &'static str;
}

impl<E: EncodedPassword + ?Sized> EncodedPassword for Box<E> {
    #[inline]
    fn matches(&self, password: &str) -> bool {
        (**self).matches(password)
    }

    #[inline]
    fn scheme(&self) -> &'static str {
        (**self).scheme()
    }
}

/// Outcome of running one parser over an encoded password.
///
/// - `Match(v)` - the parser claimed the encoding and built a verifier.
/// - `Decline` - not this parser's format; the next parser gets a chance.
/// - `Invalid(e)` - this parser's format, but malformed. The chain stops here
///   so a catch-all parser cannot accept a broken record of a stricter scheme.
#[derive(Debug)]
pub enum Parsed {
    Match(Box<dyn EncodedPassword>),
    Decline,
    Invalid(ParseError),
}

impl Parsed {
    /// Wrap a concrete verifier.
    #[inline]
    pub fn matched<E: EncodedPassword + 'static>(verifier: E) -> Self {
        Self::Match(Box::new(verifier))
    }
}

/// `Ok(None)` from a `parse` function means the prefix did not match.
impl<E: EncodedPassword + 'static> From<Result<Option<E>, ParseError>> for Parsed {
    fn from(result: Result<Option<E>, ParseError>) -> Self {
        match result {
            Ok(Some(v)) => Self::matched(v),
            Ok(None) => Self::Decline,
            Err(e) => Self::Invalid(e),
        }
    }
}

/// Refuse encodings starting with one of `prefixes`, decline the rest.
pub(crate) fn reject_prefixed(encoded: &str, prefixes: &[&str], scheme: &'static str) -> Parsed {
    if prefixes.iter().any(|prefix| encoded.starts_with(prefix)) {
        Parsed::Invalid(ParseError::Rejected { scheme })
    } else {
        Parsed::Decline
    }
}

/// A password format recognizer.
///
/// Any `Fn(&str) -> Parsed` closure or function is a parser, so callers can
/// add their own schemes to a [`ParserChain`](crate::ParserChain).
pub trait PasswdParser: Send + Sync {
    fn parse(&self, encoded: &str) -> Parsed;
}

impl<F> PasswdParser for F
where
    F: Fn(&str) -> Parsed + Send + Sync,
{
    #[inline]
    fn parse(&self, encoded: &str) -> Parsed {
        self(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Always;

    impl EncodedPassword for Always {
        fn matches(&self, _password: &str) -> bool {
            true
        }

        fn scheme(&self) -> &'static str {
            "always"
        }
    }

    #[test]
    fn parse_results_convert() {
        let parsed: Parsed = Ok::<_, ParseError>(Some(Always)).into();
        let Parsed::Match(v) = parsed else {
            panic!("expected a verifier");
        };
        assert_eq!(v.scheme(), "always");

        let parsed: Parsed = Ok::<Option<Always>, ParseError>(None).into();
        assert!(matches!(parsed, Parsed::Decline));

        let parsed: Parsed = Err::<Option<Always>, _>(ParseError::Unrecognized).into();
        assert!(matches!(parsed, Parsed::Invalid(ParseError::Unrecognized)));
    }
}
