//! Pairwise cross-encoder reranking.
//!
//! [`Reranker::rerank`] runs the whole per-request pipeline on a
//! [`PairBatch`]: encode with [`PairBatchCodec`], one forward pass through a
//! [`CrossEncoderModel`], decode back to a [`ScoreVector`] in request order.
//! A reranker is built once at startup and shared read-only afterwards.

pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod types;


pub use codec::PairBatchCodec;
pub use config::{MAX_SEQ_LEN, RerankerConfig};
pub use error::RerankerError;
pub use model::{CrossEncoderModel, StubModel};
pub use types::{EncodedBatch, Pair, PairBatch, ScoreVector};

use std::sync::Arc;

use candle_core::Device;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::model::{SequenceClassifier, load_batch_tokenizer, select_device, stub_tokenizer};

pub struct Reranker {
    device: Device,
    config: RerankerConfig,
    max_input_len: usize,
    model_loaded: bool,
    model: Arc<dyn CrossEncoderModel>,
    tokenizer: Tokenizer,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("device", &format!("{:?}", self.device))
            .field("config", &self.config)
            .field("max_input_len", &self.max_input_len)
            .field("model_loaded", &self.model_loaded)
            .finish()
    }
}

impl Reranker {
    /// Loads the model directory named by `config`, or the stub model when
    /// no path is configured.
    pub fn load(config: RerankerConfig) -> Result<Self, RerankerError> {
        if let Err(msg) = config.validate() {
            return Err(RerankerError::InvalidConfig { reason: msg });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for reranker");

        let Some(ref model_path) = config.model_path else {
            warn!("No reranker model path configured, operating in stub mode");
            return Self::create_stub(device, config);
        };

        if !model_path.exists() {
            return Err(RerankerError::ModelLoadFailed {
                reason: format!("Reranker model path not found: {}", model_path.display()),
            });
        }

        let config_path = model_path.join("config.json");
        if !config_path.exists() {
            return Err(RerankerError::ModelLoadFailed {
                reason: format!("Missing config.json in {}", model_path.display()),
            });
        }

        info!(
            model_path = %model_path.display(),
            max_seq_len = config.max_seq_len,
            "Loading reranker model"
        );

        let model = SequenceClassifier::load(model_path, &device).map_err(|e| {
            RerankerError::ModelLoadFailed {
                reason: format!("Failed to load classifier: {}", e),
            }
        })?;

        let max_input_len = effective_max_len(config.max_seq_len, &model);
        let tokenizer = load_batch_tokenizer(model_path, max_input_len).map_err(|e| {
            RerankerError::ModelLoadFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        info!(
            family = model.family().label(),
            num_labels = model.num_labels(),
            max_input_len,
            "Reranker model loaded successfully"
        );

        Ok(Self {
            device,
            config,
            max_input_len,
            model_loaded: true,
            model: Arc::new(model),
            tokenizer,
        })
    }

    pub fn stub() -> Result<Self, RerankerError> {
        Self::load(RerankerConfig::stub())
    }

    /// Assembles a reranker from an already-built model and tokenizer.
    ///
    /// The tokenizer is reconfigured for padded, truncated batches using
    /// `config.max_seq_len`, capped by the model's own limit. Input tensors
    /// are placed on `device`, which must be the device the model lives on.
    pub fn with_model(
        model: Arc<dyn CrossEncoderModel>,
        mut tokenizer: Tokenizer,
        config: RerankerConfig,
        device: Device,
    ) -> Result<Self, RerankerError> {
        if let Err(msg) = config.validate() {
            return Err(RerankerError::InvalidConfig { reason: msg });
        }

        let max_input_len = effective_max_len(config.max_seq_len, model.as_ref());
        crate::model::configure_batching(&mut tokenizer, max_input_len)?;

        Ok(Self {
            device,
            config,
            max_input_len,
            model_loaded: true,
            model,
            tokenizer,
        })
    }

    fn create_stub(device: Device, config: RerankerConfig) -> Result<Self, RerankerError> {
        let tokenizer = stub_tokenizer(config.max_seq_len)?;
        Ok(Self {
            device,
            max_input_len: config.max_seq_len,
            config,
            model_loaded: false,
            model: Arc::new(StubModel),
            tokenizer,
        })
    }

    /// Scores every pair in one forward pass; `scores[i]` belongs to `batch[i]`.
    ///
    /// An empty batch returns an empty vector without touching the tokenizer
    /// or the model.
    pub fn rerank(&self, batch: &PairBatch) -> Result<ScoreVector, RerankerError> {
        if batch.is_empty() {
            debug!("Empty pair batch, skipping inference");
            return Ok(ScoreVector::default());
        }

        let encoded = PairBatchCodec::encode(batch, &self.tokenizer, &self.device)?;

        debug!(
            pairs = encoded.pairs(),
            rows = encoded.rows(),
            seq_len = encoded.seq_len(),
            model_loaded = self.model_loaded,
            "Running cross-encoder forward pass"
        );

        let logits = self.model.forward(&encoded)?;
        let scores = PairBatchCodec::decode(&logits, encoded.pairs())?;

        debug!(scores = scores.len(), "Reranking complete");

        Ok(scores)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model_loaded
    }

    /// Truncation length in effect: the configured limit, or the model's
    /// position table when that is smaller.
    pub fn max_seq_len(&self) -> usize {
        self.max_input_len
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

fn effective_max_len(configured: usize, model: &dyn CrossEncoderModel) -> usize {
    match model.max_input_len() {
        Some(limit) if limit < configured => {
            info!(
                configured,
                limit, "Capping truncation length to the model's position table"
            );
            limit
        }
        _ => configured,
    }
}
