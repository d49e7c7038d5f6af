//! Shared defaults and protocol constants.
//!
//! Runtime overrides live in [`crate::config::Config`]; the values here are the
//! fallbacks used when no `CROSSRANK_*` variable is set.

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Maximum tokens per sequence fed to the cross-encoder (BERT-family limit).
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Upper bound on pairs accepted in a single `rerank` request.
pub const DEFAULT_MAX_PAIRS: usize = 256;

/// Number of inference calls allowed to run at once on the model's device.
pub const DEFAULT_INFERENCE_CONCURRENCY: usize = 1;

/// Number of logical blocks in an encoded pair batch (queries, then candidates).
pub const PAIR_BLOCKS: usize = 2;

/// Class index of the "relevant" channel for two-label classification heads.
pub const RELEVANT_CLASS: usize = 1;

/// Response header carrying a short machine-readable status.
pub const CROSSRANK_STATUS_HEADER: &str = "x-crossrank-status";

pub const CROSSRANK_STATUS_HEALTHY: &str = "healthy";
pub const CROSSRANK_STATUS_READY: &str = "ready";
pub const CROSSRANK_STATUS_SCORED: &str = "scored";
pub const CROSSRANK_STATUS_INVALID_REQUEST: &str = "invalid_request";
pub const CROSSRANK_STATUS_ERROR: &str = "error";
