//! `crypt(3)` base64 codec shared by the md5-crypt and sha-crypt schemes.
//!
//! Unlike RFC 4648 base64, the alphabet starts with `./0-9`, bytes are taken
//! in a scheme-specific order, and every 24-bit group is emitted least
//! significant 6 bits first.
//!
//! ```text
//! [.-9]      [A-Z]      [a-z]
//! 0x2e-0x39, 0x41-0x5a, 0x61-0x7a
//! ```

/// The 64-symbol crypt alphabet.
pub(crate) const ALPHABET: &[u8; 64] =
    b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Byte order used to turn a raw digest into its encoded form.
#[derive(Debug)]
pub(crate) struct Layout {
    /// Full 3-byte groups, most significant byte first. Each yields 4 chars.
    pub groups: &'static [[usize; 3]],
    /// Trailing bytes that do not fill a group, most significant first.
    /// They yield `tail.len() + 1` chars.
    pub tail: &'static [usize],
}

impl Layout {
    /// Length of the raw digest this layout covers.
    pub const fn digest_len(&self) -> usize {
        self.groups.len() * 3 + self.tail.len()
    }

    /// Length of the encoded string.
    pub const fn encoded_len(&self) -> usize {
        let tail = if self.tail.is_empty() {
            0
        } else {
            self.tail.len() + 1
        };
        self.groups.len() * 4 + tail
    }
}

/// Why a crypt64 string could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeError {
    Length,
    Character,
    TrailingBits,
}

impl DecodeError {
    pub(crate) const fn reason(self) -> &'static str {
        match self {
            Self::Length => "hash has wrong length",
            Self::Character => "hash contains a character outside the crypt alphabet",
            Self::TrailingBits => "hash has non-zero trailing bits",
        }
    }
}

/// Encode `digest` through `layout`.
pub(crate) fn encode(digest: &[u8], layout: &Layout) -> String {
    debug_assert_eq!(digest.len(), layout.digest_len());

    let mut out = String::with_capacity(layout.encoded_len());
    for &[b2, b1, b0] in layout.groups {
        let w = (u32::from(digest[b2]) << 16) | (u32::from(digest[b1]) << 8) | u32::from(digest[b0]);
        push_chars(&mut out, w, 4);
    }
    if !layout.tail.is_empty() {
        let w = layout
            .tail
            .iter()
            .fold(0u32, |w, &i| (w << 8) | u32::from(digest[i]));
        push_chars(&mut out, w, layout.tail.len() + 1);
    }
    out
}

/// Decode `encoded` back into raw digest bytes, undoing the layout permutation.
///
/// Only canonical encodings are accepted: bits beyond the tail bytes must be zero.
pub(crate) fn decode(encoded: &str, layout: &Layout) -> Result<Vec<u8>, DecodeError> {
    let bytes = encoded.as_bytes();
    if bytes.len() != layout.encoded_len() {
        return Err(DecodeError::Length);
    }

    let mut digest = vec![0u8; layout.digest_len()];
    let mut chunks = bytes.chunks(4);

    for &[b2, b1, b0] in layout.groups {
        let w = read_chars(chunks.next().ok_or(DecodeError::Length)?)?;
        digest[b2] = (w >> 16) as u8;
        digest[b1] = (w >> 8) as u8;
        digest[b0] = w as u8;
    }

    if !layout.tail.is_empty() {
        let w = read_chars(chunks.next().ok_or(DecodeError::Length)?)?;
        if w >> (8 * layout.tail.len()) != 0 {
            return Err(DecodeError::TrailingBits);
        }
        for (shift, &i) in layout.tail.iter().rev().enumerate() {
            digest[i] = (w >> (8 * shift)) as u8;
        }
    }

    Ok(digest)
}

/// Repeat `src` cyclically until exactly `len` bytes, stopping mid-cycle if needed.
///
/// An empty `src` yields an empty result.
pub(crate) fn cycle(src: &[u8], len: usize) -> Vec<u8> {
    src.iter().copied().cycle().take(len).collect()
}

/// Salt text kept for re-encoding: the first `max` bytes, extended to the
/// end of a multibyte character cut at `max`.
///
/// The digest only ever sees the first `max` bytes, so the kept text parses
/// back to the same salt bytes.
pub(crate) fn salt_text(salt: &str, max: usize) -> &str {
    if salt.len() <= max {
        return salt;
    }
    let mut end = max;
    while !salt.is_char_boundary(end) {
        end += 1;
    }
    &salt[..end]
}

/// The salt bytes fed to the digest.
#[inline]
pub(crate) fn salt_bytes(salt: &str, max: usize) -> &[u8] {
    let bytes = salt.as_bytes();
    &bytes[..bytes.len().min(max)]
}

/// Whether `c` belongs to the crypt alphabet.
#[inline]
pub(crate) fn is_crypt_char(c: u8) -> bool {
    decode_char(c).is_some()
}

#[inline]
fn push_chars(out: &mut String, mut w: u32, n: usize) {
    for _ in 0..n {
        out.push(char::from(ALPHABET[(w & 0x3f) as usize]));
        w >>= 6;
    }
}

fn read_chars(chunk: &[u8]) -> Result<u32, DecodeError> {
    chunk.iter().enumerate().try_fold(0u32, |w, (i, &c)| {
        let v = decode_char(c).ok_or(DecodeError::Character)?;
        Ok(w | (u32::from(v) << (6 * i)))
    })
}

#[inline]
fn decode_char(c: u8) -> Option<u8> {
    match c {
        b'.'..=b'9' => Some(c - b'.'),
        b'A'..=b'Z' => Some(c - b'A' + 12),
        b'a'..=b'z' => Some(c - b'a' + 38),
        _ => None,
    }
}
