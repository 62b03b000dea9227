//! Statement identifiers.
//!
//! The judge identifies every statement by a `(sequence, generation)` pair:
//! a monotonically assigned sequence slot plus a generation counter that
//! disambiguates slots reused after deletion. The pair is assigned by the
//! server and never minted client-side — the only id a client may assume is
//! [`StatementId::ROOT`], which the server pre-creates at session start.
//!
//! On the wire an id is a two-element array `[seq, gen]`. As a map key or
//! DOM-ish handle it uses the canonical string encoding `"seq,gen"`
//! (see [`fmt::Display`] / [`std::str::FromStr`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a statement node, assigned by the judge.
///
/// Serializes as a two-element array `[seq, gen]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatementId(u64, u64);

impl StatementId {
    /// The root statement's id. The server pre-creates the root node at
    /// `(0, 0)` by convention; the client never allocates this itself.
    pub const ROOT: Self = Self(0, 0);

    /// Build an id from a sequence slot and generation counter.
    #[must_use]
    pub const fn new(seq: u64, generation: u64) -> Self {
        Self(seq, generation)
    }

    /// The sequence slot.
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.0
    }

    /// The generation counter for the slot.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.1
    }

    /// Whether this is the root id `(0, 0)`.
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == 0 && self.1 == 0
    }
}

impl fmt::Display for StatementId {
    /// Canonical `"seq,gen"` encoding.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

/// Error parsing a canonical `"seq,gen"` statement id string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid statement id {input:?}: expected \"seq,gen\"")]
pub struct ParseStatementIdError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for StatementId {
    type Err = ParseStatementIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseStatementIdError { input: s.to_owned() };
        let (seq, generation) = s.split_once(',').ok_or_else(err)?;
        let seq: u64 = seq.trim().parse().map_err(|_| err())?;
        let generation: u64 = generation.trim().parse().map_err(|_| err())?;
        Ok(Self(seq, generation))
    }
}
