use candle::{DType, Device, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{self, BertModel};
use candle_transformers::models::xlm_roberta::{self, XLMRobertaForSequenceClassification};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Encoder architecture behind a sequence-classification checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderFamily {
    /// BERT, MiniLM and friends: absolute positions `0..seq_len`, linear head.
    Bert,
    /// RoBERTa / XLM-RoBERTa: positions offset past `pad_token_id`,
    /// dense + tanh + out_proj head.
    XlmRoberta,
}

impl EncoderFamily {
    /// Reads `model_type`, then `architectures`, from a parsed `config.json`.
    pub fn from_config(raw: &Value) -> Option<Self> {
        if let Some(model_type) = raw.get("model_type").and_then(Value::as_str) {
            match model_type {
                "xlm-roberta" | "roberta" => return Some(Self::XlmRoberta),
                "bert" => return Some(Self::Bert),
                _ => {}
            }
        }

        let architectures = raw.get("architectures").and_then(Value::as_array)?;
        architectures
            .iter()
            .filter_map(Value::as_str)
            .find_map(|arch| {
                if arch.contains("Roberta") {
                    Some(Self::XlmRoberta)
                } else if arch.starts_with("Bert") {
                    Some(Self::Bert)
                } else {
                    None
                }
            })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bert => "bert",
            Self::XlmRoberta => "xlm-roberta",
        }
    }
}

/// The parts of `config.json` that shape the head and the input limit.
#[derive(Debug, Default, Deserialize)]
struct ClassifierConfig {
    num_labels: Option<usize>,
    id2label: Option<HashMap<String, String>>,
    max_position_embeddings: Option<usize>,
    pad_token_id: Option<usize>,
}

impl ClassifierConfig {
    fn num_labels(&self) -> usize {
        self.num_labels
            .or_else(|| self.id2label.as_ref().map(|labels| labels.len()))
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }

    /// Longest token row the position table can index.
    ///
    /// RoBERTa-style encoders number real tokens from `pad_token_id + 1`, so
    /// that many slots are unavailable.
    fn max_input_len(&self, family: EncoderFamily) -> Option<usize> {
        let positions = self.max_position_embeddings?;
        let reserved = match family {
            EncoderFamily::Bert => 0,
            EncoderFamily::XlmRoberta => self.pad_token_id.unwrap_or(1) + 1,
        };
        Some(positions.saturating_sub(reserved)).filter(|n| *n > 0)
    }
}

#[derive(Deserialize)]
struct SafetensorsIndex {
    weight_map: HashMap<String, String>,
}

enum Encoder {
    Bert { bert: BertModel, classifier: Linear },
    XlmRoberta(XLMRobertaForSequenceClassification),
}

impl Encoder {
    fn load(vb: VarBuilder, family: EncoderFamily, raw: Value, num_labels: usize) -> Result<Self> {
        match family {
            EncoderFamily::Bert => {
                let config: bert::Config = serde_json::from_value(raw)
                    .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;
                let bert = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
                    BertModel::load(vb.pp("bert"), &config)?
                } else {
                    BertModel::load(vb.clone(), &config)?
                };
                let classifier =
                    candle_nn::linear(config.hidden_size, num_labels, vb.pp("classifier"))?;
                Ok(Self::Bert { bert, classifier })
            }
            EncoderFamily::XlmRoberta => {
                let config = xlm_roberta_config(raw)?;
                let model = XLMRobertaForSequenceClassification::new(num_labels, &config, vb)?;
                Ok(Self::XlmRoberta(model))
            }
        }
    }

    fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        match self {
            Self::Bert { bert, classifier } => {
                let output = bert.forward(input_ids, token_type_ids, Some(attention_mask))?;
                let cls_token = output.i((.., 0, ..))?;
                classifier.forward(&cls_token)
            }
            Self::XlmRoberta(model) => model.forward(input_ids, attention_mask, token_type_ids),
        }
    }
}

/// `position_embedding_type` is required by candle's XLM-R config but often
/// omitted from checkpoints that use the default.
fn xlm_roberta_config(mut raw: Value) -> Result<xlm_roberta::Config> {
    if let Some(object) = raw.as_object_mut() {
        object
            .entry("position_embedding_type")
            .or_insert_with(|| Value::String("absolute".to_string()));
    }
    serde_json::from_value(raw)
        .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))
}

struct SequenceClassifierImpl {
    encoder: Encoder,
    family: EncoderFamily,
    num_labels: usize,
    max_input_len: Option<usize>,
}

/// Sequence-classification cross-encoder: a BERT or XLM-RoBERTa encoder plus
/// a `[rows, num_labels]` logit head over the first token.
#[derive(Clone)]
pub struct SequenceClassifier(std::sync::Arc<SequenceClassifierImpl>);

impl SequenceClassifier {
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let config_content = std::fs::read_to_string(model_dir.join("config.json"))?;
        let raw: Value = serde_json::from_str(&config_content)
            .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;
        let head: ClassifierConfig = serde_json::from_value(raw.clone())
            .map_err(|e| candle::Error::Msg(format!("Failed to parse head config: {}", e)))?;

        let weights = weight_files(model_dir)?;
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(weights.as_slice(), DType::F32, device)?
        };

        let family = match EncoderFamily::from_config(&raw) {
            Some(family) => family,
            None if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") => {
                EncoderFamily::XlmRoberta
            }
            None => EncoderFamily::Bert,
        };
        debug!(family = family.label(), "Resolved encoder family");

        let num_labels = head.num_labels();
        let max_input_len = head.max_input_len(family);
        let encoder = Encoder::load(vb, family, raw, num_labels)?;

        Ok(Self(std::sync::Arc::new(SequenceClassifierImpl {
            encoder,
            family,
            num_labels,
            max_input_len,
        })))
    }

    /// Returns logits shaped `[rows, num_labels]`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        self.0
            .encoder
            .forward(input_ids, token_type_ids, attention_mask)
    }

    pub fn family(&self) -> EncoderFamily {
        self.0.family
    }

    pub fn num_labels(&self) -> usize {
        self.0.num_labels
    }

    /// Token limit implied by the position table, when `config.json` has one.
    pub fn max_input_len(&self) -> Option<usize> {
        self.0.max_input_len
    }
}

/// Shard file names from a `model.safetensors.index.json`, sorted and unique.
pub fn shard_names(index_json: &str) -> Result<Vec<String>> {
    let index: SafetensorsIndex = serde_json::from_str(index_json)
        .map_err(|e| candle::Error::Msg(format!("Failed to parse weight index: {}", e)))?;

    let mut shards: Vec<String> = index.weight_map.into_values().collect();
    shards.sort();
    shards.dedup();

    if shards.is_empty() {
        return Err(candle::Error::Msg("Empty weight_map in weight index".to_string()));
    }
    Ok(shards)
}

/// Resolves `model.safetensors`, or every shard listed in
/// `model.safetensors.index.json`.
pub fn weight_files(model_dir: &Path) -> Result<Vec<PathBuf>> {
    let single = model_dir.join("model.safetensors");
    if single.exists() {
        return Ok(vec![single]);
    }

    let index_path = model_dir.join("model.safetensors.index.json");
    if !index_path.exists() {
        return Err(candle::Error::Msg(format!(
            "Missing model.safetensors (or model.safetensors.index.json) in {}",
            model_dir.display()
        )));
    }

    let text = std::fs::read_to_string(&index_path)?;
    let files: Vec<PathBuf> = shard_names(&text)?
        .into_iter()
        .map(|s| model_dir.join(s))
        .collect();
    if let Some(missing) = files.iter().find(|p| !p.exists()) {
        return Err(candle::Error::Msg(format!(
            "Missing weight file: {}",
            missing.display()
        )));
    }

    Ok(files)
}
