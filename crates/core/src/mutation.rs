//! Mutation tokens and mutation state.
//!
//! A [`MutationToken`] marks the causal position of one write: the partition
//! (vbucket) it landed in, that partition's UUID, the sequence number within
//! it, and the bucket. A [`MutationState`] is the ordered list of tokens a
//! query must be consistent with.
//!
//! Callers hand tokens over in their native form (JSON objects). The
//! translator validates each one and keeps the input order. Duplicates are
//! kept: causality tracking is positional, not set based.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Causal position of a single mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationToken {
    /// Partition (vbucket) identifier
    pub partition_id: u16,
    /// UUID of the partition's history branch
    pub partition_uuid: u64,
    /// Sequence number within the partition
    pub sequence_number: u64,
    /// Bucket the mutation was made in
    pub bucket_name: String,
}

impl MutationToken {
    /// Create a token.
    pub fn new(
        partition_id: u16,
        partition_uuid: u64,
        sequence_number: u64,
        bucket_name: impl Into<String>,
    ) -> Self {
        MutationToken {
            partition_id,
            partition_uuid,
            sequence_number,
            bucket_name: bucket_name.into(),
        }
    }

    /// Translate one caller-supplied token.
    ///
    /// `index` is the token's position in the caller's sequence and is echoed
    /// back in [`Error::MalformedMutationToken`].
    pub fn from_caller(index: usize, token: &JsonValue) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedMutationToken { index, reason };

        let raw = RawToken::deserialize(token).map_err(|e| malformed(e.to_string()))?;
        let partition_id = u16::try_from(raw.partition_id).map_err(|_| {
            malformed(format!(
                "field `partition_id` out of range: {}",
                raw.partition_id
            ))
        })?;
        if raw.bucket_name.is_empty() {
            return Err(malformed("field `bucket_name` must not be empty".to_string()));
        }

        Ok(MutationToken {
            partition_id,
            partition_uuid: raw.partition_uuid,
            sequence_number: raw.sequence_number,
            bucket_name: raw.bucket_name,
        })
    }
}

/// Token as the caller hands it over, before range checks.
#[derive(Deserialize)]
struct RawToken {
    partition_id: u64,
    partition_uuid: u64,
    sequence_number: u64,
    bucket_name: String,
}

/// Ordered set of mutation tokens a query should be consistent with.
///
/// Empty means "no additional consistency constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationState {
    tokens: Vec<MutationToken>,
}

impl MutationState {
    /// Create an empty mutation state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a caller-supplied token sequence.
    ///
    /// Fails on the first malformed token, naming its index. Output order
    /// matches input order and duplicates are preserved.
    pub fn from_tokens(tokens: &[JsonValue]) -> Result<Self> {
        let tokens = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| MutationToken::from_caller(i, t))
            .collect::<Result<Vec<_>>>()?;
        Ok(MutationState { tokens })
    }

    /// Append a token.
    pub fn add(&mut self, token: MutationToken) {
        self.tokens.push(token);
    }

    /// Tokens in insertion order.
    pub fn tokens(&self) -> &[MutationToken] {
        &self.tokens
    }

    /// Iterate tokens in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, MutationToken> {
        self.tokens.iter()
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Consume into the engine's token vector.
    pub fn into_tokens(self) -> Vec<MutationToken> {
        self.tokens
    }
}

impl From<Vec<MutationToken>> for MutationState {
    fn from(tokens: Vec<MutationToken>) -> Self {
        MutationState { tokens }
    }
}

impl<'a> IntoIterator for &'a MutationState {
    type Item = &'a MutationToken;
    type IntoIter = std::slice::Iter<'a, MutationToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Translate a caller-supplied token sequence into a [`MutationState`].
pub fn translate(tokens: &[JsonValue]) -> Result<MutationState> {
    MutationState::from_tokens(tokens)
}
