//! Model-side collaborators: weights, tokenizer, and device.
//!
//! - [`classifier`] loads a sequence-classification cross-encoder with candle.
//! - [`hub`] resolves a Hugging Face model id to a local snapshot.
//! - [`tokenizer`] prepares `tokenizers` for padded, truncated batches.
//! - [`device`] resolves the inference device once.

/// BERT / XLM-RoBERTa sequence classifiers.
pub mod classifier;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
/// Hugging Face Hub downloads.
pub mod hub;
/// Tokenizer loading and batch configuration.
pub mod tokenizer;

pub use classifier::{EncoderFamily, SequenceClassifier};
pub use device::{device_label, select_device};
pub use hub::fetch_model;
pub use tokenizer::{configure_batching, load_batch_tokenizer, stub_tokenizer};
