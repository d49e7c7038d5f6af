//! crossrank library crate (used by the server binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Reranking core
//! - [`Reranker`], [`RerankerConfig`], [`RerankerError`] - model handle and the
//!   per-request `rerank` pipeline
//! - [`Pair`], [`PairBatch`], [`ScoreVector`], [`EncodedBatch`] - request data model
//! - [`PairBatchCodec`] - the queries-then-candidates block layout, encode and decode
//! - [`CrossEncoderModel`] - forward-pass seam (real classifier or a stub)
//!
//! ## Service
//! - [`Config`], [`ConfigError`], [`ModelSource`] - environment-backed server configuration
//! - [`gateway`] - Axum router, handlers, and error mapping
//!
//! ## Model collaborators
//! - [`model`] - candle BERT / XLM-RoBERTa classifiers, Hub downloads, tokenizer setup,
//!   device selection

pub mod config;
pub mod constants;
pub mod gateway;
pub mod model;
pub mod reranker;

pub use config::{Config, ConfigError, ModelSource};
pub use gateway::{HandlerState, create_router_with_state};
pub use reranker::{
    CrossEncoderModel, EncodedBatch, Pair, PairBatch, PairBatchCodec, Reranker, RerankerConfig,
    RerankerError, ScoreVector, StubModel,
};
