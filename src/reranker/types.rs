use candle_core::Tensor;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One (query, candidate) text pair submitted for scoring.
pub struct Pair {
    /// Query text.
    pub query: String,
    /// Candidate text judged against the query.
    pub candidate: String,
}

impl Pair {
    /// Creates a pair.
    pub fn new(query: impl Into<String>, candidate: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            candidate: candidate.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Ordered pairs for one request. Scores come back in the same order.
pub struct PairBatch(Vec<Pair>);

impl PairBatch {
    /// Wraps pairs, preserving order.
    pub fn new(pairs: Vec<Pair>) -> Self {
        Self(pairs)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the batch holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates pairs in request order.
    pub fn iter(&self) -> std::slice::Iter<'_, Pair> {
        self.0.iter()
    }

    /// Query texts in request order.
    pub fn queries(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.query.as_str())
    }

    /// Candidate texts in request order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.candidate.as_str())
    }
}

impl From<Vec<Pair>> for PairBatch {
    fn from(pairs: Vec<Pair>) -> Self {
        Self(pairs)
    }
}

impl FromIterator<Pair> for PairBatch {
    fn from_iter<I: IntoIterator<Item = Pair>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PairBatch {
    type Item = &'a Pair;
    type IntoIter = std::slice::Iter<'a, Pair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Raw relevance logits, position `i` belonging to pair `i`.
pub struct ScoreVector(Vec<f32>);

impl ScoreVector {
    pub fn new(scores: Vec<f32>) -> Self {
        Self(scores)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }
}

/// Token tensors for one pair batch: `2 * pairs` rows, queries first, then
/// candidates, all padded to the longest row.
#[derive(Debug)]
pub struct EncodedBatch {
    pub(crate) input_ids: Tensor,
    pub(crate) token_type_ids: Tensor,
    pub(crate) attention_mask: Tensor,
    pub(crate) pairs: usize,
}

impl EncodedBatch {
    /// `[rows, seq_len]` token ids.
    pub fn input_ids(&self) -> &Tensor {
        &self.input_ids
    }

    /// `[rows, seq_len]` segment ids (all zero, every row is a single segment).
    pub fn token_type_ids(&self) -> &Tensor {
        &self.token_type_ids
    }

    /// `[rows, seq_len]` mask, 1 for real tokens and 0 for padding.
    pub fn attention_mask(&self) -> &Tensor {
        &self.attention_mask
    }

    /// Number of pairs encoded (half the row count).
    pub fn pairs(&self) -> usize {
        self.pairs
    }

    /// Number of token rows.
    pub fn rows(&self) -> usize {
        self.input_ids.dims().first().copied().unwrap_or(0)
    }

    /// Padded row length.
    pub fn seq_len(&self) -> usize {
        self.input_ids.dims().get(1).copied().unwrap_or(0)
    }
}
