use std::io;
use std::path::Path;
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams,
};

/// Whitespace word-level tokenizer used when no model directory is configured.
/// Every word maps to `[UNK]`, so only sequence lengths carry signal.
const STUB_TOKENIZER_JSON: &str = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": null,
  "pre_tokenizer": { "type": "Whitespace" },
  "post_processor": null,
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": { "[PAD]": 0, "[UNK]": 1 },
    "unk_token": "[UNK]"
  }
}"#;

/// Loads a tokenizer from a model directory or explicit tokenizer.json path.
pub fn load_tokenizer(model_path: &Path) -> io::Result<Tokenizer> {
    let tokenizer_path = if model_path
        .file_name()
        .is_some_and(|name| name == std::ffi::OsStr::new("tokenizer.json"))
    {
        model_path.to_path_buf()
    } else if model_path.is_dir() {
        model_path.join("tokenizer.json")
    } else {
        model_path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Model path has no parent"))?
            .join("tokenizer.json")
    };

    Tokenizer::from_file(&tokenizer_path).map_err(io::Error::other)
}

/// Loads a tokenizer and prepares it for batched cross-encoder input.
pub fn load_batch_tokenizer(model_path: &Path, max_len: usize) -> io::Result<Tokenizer> {
    let mut tokenizer = load_tokenizer(model_path)?;
    configure_batching(&mut tokenizer, max_len)?;
    Ok(tokenizer)
}

/// Built-in tokenizer for stub mode, configured like a real one.
pub fn stub_tokenizer(max_len: usize) -> io::Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_bytes(STUB_TOKENIZER_JSON).map_err(io::Error::other)?;
    configure_batching(&mut tokenizer, max_len)?;
    Ok(tokenizer)
}

/// Pads every batch on the right to its longest row and truncates each text
/// from the tail to `max_len` tokens.
///
/// A padding config shipped in `tokenizer.json` keeps its pad token and id;
/// strategy and direction are overridden, since the classifier head reads
/// position 0.
pub fn configure_batching(tokenizer: &mut Tokenizer, max_len: usize) -> io::Result<()> {
    if let Some(padding) = tokenizer.get_padding_mut() {
        padding.strategy = PaddingStrategy::BatchLongest;
        padding.direction = PaddingDirection::Right;
    } else {
        let padding = pad_token_for(tokenizer)
            .map(|(pad_id, pad_token)| PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                direction: PaddingDirection::Right,
                pad_id,
                pad_token,
                ..Default::default()
            })
            .unwrap_or_else(|| PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                direction: PaddingDirection::Right,
                ..Default::default()
            });
        tokenizer.with_padding(Some(padding));
    }

    let truncation = TruncationParams {
        max_length: max_len,
        direction: TruncationDirection::Right,
        ..Default::default()
    };

    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| io::Error::other(format!("Failed to configure truncation: {}", e)))?;

    Ok(())
}

fn pad_token_for(tokenizer: &Tokenizer) -> Option<(u32, String)> {
    ["[PAD]", "<pad>"].iter().find_map(|token| {
        tokenizer
            .token_to_id(token)
            .map(|id| (id, (*token).to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_tokenizer_pads_to_longest() {
        let tokenizer = stub_tokenizer(16).unwrap();
        let encodings = tokenizer
            .encode_batch(vec!["one", "one two three"], true)
            .unwrap();

        assert_eq!(encodings.len(), 2);
        assert_eq!(encodings[0].get_ids().len(), 3);
        assert_eq!(encodings[1].get_ids().len(), 3);
        assert_eq!(encodings[0].get_attention_mask(), &[1, 0, 0]);
        assert_eq!(encodings[1].get_attention_mask(), &[1, 1, 1]);
    }

    #[test]
    fn test_stub_tokenizer_truncates_tail() {
        let tokenizer = stub_tokenizer(2).unwrap();
        let encoding = tokenizer.encode("a b c d e", true).unwrap();

        assert_eq!(encoding.get_ids().len(), 2);
    }

    #[test]
    fn test_stub_tokenizer_uses_pad_id_zero() {
        let tokenizer = stub_tokenizer(8).unwrap();
        let encodings = tokenizer.encode_batch(vec!["", "word"], true).unwrap();

        assert_eq!(encodings[0].get_ids(), &[0]);
        assert_eq!(encodings[1].get_ids(), &[1]);
    }

    #[test]
    fn test_load_tokenizer_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_tokenizer(dir.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_load_batch_tokenizer_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tokenizer.json"), STUB_TOKENIZER_JSON).unwrap();

        let tokenizer = load_batch_tokenizer(dir.path(), 4).unwrap();
        let padding = tokenizer.get_padding().unwrap();
        assert!(matches!(padding.strategy, PaddingStrategy::BatchLongest));
        assert_eq!(tokenizer.get_truncation().unwrap().max_length, 4);
    }

    #[test]
    fn test_shipped_left_padding_is_forced_right() {
        let json = STUB_TOKENIZER_JSON.replace(
            r#""padding": null"#,
            r#""padding": {
                "strategy": {"Fixed": 6},
                "direction": "Left",
                "pad_to_multiple_of": null,
                "pad_id": 0,
                "pad_type_id": 0,
                "pad_token": "[PAD]"
            }"#,
        );
        let mut tokenizer = Tokenizer::from_bytes(json).unwrap();
        configure_batching(&mut tokenizer, 8).unwrap();

        let padding = tokenizer.get_padding().unwrap();
        assert!(matches!(padding.direction, PaddingDirection::Right));
        assert!(matches!(padding.strategy, PaddingStrategy::BatchLongest));

        let encodings = tokenizer.encode_batch(vec!["one", "one two"], true).unwrap();
        assert_eq!(encodings[0].get_attention_mask(), &[1, 0]);
    }
}
