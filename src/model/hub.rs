use std::path::{Path, PathBuf};
use std::time::Duration;

use hf_hub::api::tokio::{ApiBuilder, ApiError, ApiRepo};
use hf_hub::{Repo, RepoType};
use tracing::{debug, info};

use crate::model::classifier::shard_names;
use crate::reranker::RerankerError;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SINGLE_WEIGHTS_FILE: &str = "model.safetensors";
const WEIGHT_INDEX_FILE: &str = "model.safetensors.index.json";

const MAX_LOCK_RETRIES: u32 = 3;

/// Downloads (or reuses from the local Hugging Face cache) everything a
/// cross-encoder needs and returns the snapshot directory holding it.
///
/// Honors `HF_HOME` / `HF_ENDPOINT` through `hf-hub`. `revision` defaults to
/// `main`.
pub async fn fetch_model(model_id: &str, revision: Option<&str>) -> Result<PathBuf, RerankerError> {
    let api = ApiBuilder::new()
        .with_progress(false)
        .build()
        .map_err(|e| hub_error(model_id, CONFIG_FILE, e))?;

    let repo = match revision {
        Some(revision) => Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ),
        None => Repo::new(model_id.to_string(), RepoType::Model),
    };
    let repo = api.repo(repo);

    info!(model_id, revision = revision.unwrap_or("main"), "Resolving model from Hugging Face Hub");

    let config_path = get_with_retry(&repo, model_id, CONFIG_FILE).await?;
    get_with_retry(&repo, model_id, TOKENIZER_FILE).await?;

    match get_with_retry(&repo, model_id, SINGLE_WEIGHTS_FILE).await {
        Ok(_) => {}
        Err(single_err) => {
            debug!(error = %single_err, "No single weights file, trying sharded index");
            let index_path = get_with_retry(&repo, model_id, WEIGHT_INDEX_FILE)
                .await
                .map_err(|_| single_err)?;
            let index = tokio::fs::read_to_string(&index_path).await?;
            let shards = shard_names(&index).map_err(|e| RerankerError::ModelLoadFailed {
                reason: format!("invalid weight index for {model_id}: {e}"),
            })?;
            for shard in &shards {
                get_with_retry(&repo, model_id, shard).await?;
            }
        }
    }

    let model_dir = snapshot_dir(&config_path)?;
    info!(model_id, path = %model_dir.display(), "Model files ready");
    Ok(model_dir)
}

async fn get_with_retry(
    repo: &ApiRepo,
    model_id: &str,
    filename: &str,
) -> Result<PathBuf, RerankerError> {
    let mut attempt = 0;
    loop {
        match repo.get(filename).await {
            Ok(path) => return Ok(path),
            Err(e) if is_lock_contention(&e) && attempt + 1 < MAX_LOCK_RETRIES => {
                let wait = Duration::from_millis(100 * (1 << attempt));
                debug!(filename, attempt, "Hub cache locked, retrying");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(hub_error(model_id, filename, e)),
        }
    }
}

fn is_lock_contention(err: &ApiError) -> bool {
    err.to_string().contains("Lock acquisition failed")
}

fn hub_error(model_id: &str, filename: &str, err: ApiError) -> RerankerError {
    RerankerError::ModelLoadFailed {
        reason: format!("failed to fetch {filename} for {model_id}: {err}"),
    }
}

/// Every file of one revision lands in the same snapshot directory.
fn snapshot_dir(config_path: &Path) -> Result<PathBuf, RerankerError> {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| RerankerError::ModelLoadFailed {
            reason: format!("cached {} has no parent directory", config_path.display()),
        })
}
