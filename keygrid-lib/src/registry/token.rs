//! Identity tokens

use std::fmt;

use rand::Rng;

use crate::error::ParseError;

/// Characters a token may contain: ASCII letters, digits and punctuation,
/// excluding the payload delimiter `:`.
pub const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!#$%&*+,-./;<=>?@[\\]^_{}~";

/// Short opaque key identifying a live widget instance within its registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

impl Token {
    /// Parses a token, checking it is non-empty and uses only [`ALPHABET`].
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        if raw.is_empty() || !raw.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(ParseError::InvalidToken(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// A token of `length` copies of the first alphabet character.
    pub(crate) fn filled(length: usize) -> Self {
        Self((ALPHABET[0] as char).to_string().repeat(length.max(1)))
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the token length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the token is empty. Parsed tokens never are.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Samples random tokens of a fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenGenerator {
    length: usize,
}

impl TokenGenerator {
    /// Creates a generator for tokens of `length` characters.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Returns the number of distinct tokens, saturating at `u128::MAX`.
    pub fn space(&self) -> u128 {
        (ALPHABET.len() as u128).saturating_pow(self.length as u32)
    }

    /// Samples tokens until one is not `taken`.
    ///
    /// Terminates quickly as long as the number of taken tokens is far below
    /// [`space`](Self::space); registries enforce that at construction.
    pub fn generate(&self, taken: impl Fn(&Token) -> bool) -> Token {
        self.generate_with(&mut rand::rng(), taken)
    }

    /// Like [`generate`](Self::generate) with an explicit random source.
    pub fn generate_with<R: Rng>(&self, rng: &mut R, taken: impl Fn(&Token) -> bool) -> Token {
        loop {
            let token = self.sample(rng);
            if !taken(&token) {
                return token;
            }
        }
    }

    /// Samples one token without checking for collisions.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Token {
        let token = (0..self.length)
            .map(|_| {
                let idx = rng.random_range(0..ALPHABET.len());
                ALPHABET[idx] as char
            })
            .collect();
        Token(token)
    }
}
