use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaConfig, LlamaEosToks};
use hf_hub::api::sync::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::{Generation, GenerationParams, TextGenerator};
use crate::error::InferenceError;

// Tried in order when config.json does not name an EOS token
const FALLBACK_EOS: [&str; 3] = ["<|eot_id|>", "<|end_of_text|>", "</s>"];

// Llama-family causal LM held in memory for the lifetime of the process.
// The weights are only read during forward passes; each request builds its
// own KV cache, so no lock is needed.
pub struct LlamaGenerator {
    model_id: String,
    model: Llama,
    config: Config,
    tokenizer: Tokenizer,
    eos_ids: Vec<u32>,
    device: Device,
    dtype: DType,
}

impl LlamaGenerator {
    // fetch from the hub (or its local cache) and load on the best device
    pub fn download(
        model_id: &str,
        revision: &str,
        hf_token: Option<String>,
        force_cpu: bool,
    ) -> Result<Self, InferenceError> {
        let api = ApiBuilder::new().with_token(hf_token).build()?;
        let repo = api.repo(Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));

        info!(model = model_id, revision, "fetching model files");
        let config_path = repo.get("config.json")?;
        let tokenizer_path = repo.get("tokenizer.json")?;
        let weights = weight_files(&repo)?;
        info!(model = model_id, shards = weights.len(), "model files ready");

        let device = if force_cpu {
            Device::Cpu
        } else {
            Device::cuda_if_available(0)?
        };

        Self::from_files(model_id, &config_path, &tokenizer_path, &weights, device)
    }

    pub fn from_files(
        model_id: &str,
        config_path: &Path,
        tokenizer_path: &Path,
        weights: &[PathBuf],
        device: Device,
    ) -> Result<Self, InferenceError> {
        let dtype = if device.is_cuda() {
            DType::BF16
        } else {
            DType::F32
        };

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;

        let llama_config: LlamaConfig = serde_json::from_slice(&fs::read(config_path)?)?;
        let config = llama_config.into_config(false);

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(weights, dtype, &device)? };
        let model = Llama::load(vb, &config)?;

        let eos_ids = eos_ids(config.eos_token_id.as_ref(), |tok| {
            tokenizer.token_to_id(tok)
        });
        if eos_ids.is_empty() {
            return Err(InferenceError::Model(format!(
                "{model_id} declares no end-of-sequence token"
            )));
        }

        info!(model = model_id, device = ?device, dtype = ?dtype, "model loaded");

        Ok(Self {
            model_id: model_id.to_string(),
            model,
            config,
            tokenizer,
            eos_ids,
            device,
            dtype,
        })
    }
}

impl TextGenerator for LlamaGenerator {
    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Generation, InferenceError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;
        let mut tokens = encoding.get_ids().to_vec();
        let prompt_len = tokens.len();

        let budget = new_token_budget(prompt_len, params.max_length)?;
        if prompt_len >= params.max_length {
            debug!(prompt_len, max_length = params.max_length, "prompt fills the length budget");
        }

        let mut cache = Cache::new(true, self.dtype, &self.config, &self.device)?;
        let temperature = (params.temperature > 0.0).then_some(params.temperature);
        let mut sampler = LogitsProcessor::new(params.seed(), temperature, Some(params.top_p));

        let mut index_pos = 0;
        for step in 0..budget {
            // Whole prompt on the first pass, then only the newest token
            let context = if step == 0 {
                &tokens[..]
            } else {
                &tokens[tokens.len() - 1..]
            };
            let input = Tensor::new(context, &self.device)?.unsqueeze(0)?;
            let logits = self
                .model
                .forward(&input, index_pos, &mut cache)?
                .squeeze(0)?
                .to_dtype(DType::F32)?;
            index_pos += context.len();

            let next = sampler.sample(&logits)?;
            if self.eos_ids.contains(&next) {
                break;
            }
            tokens.push(next);
        }

        let continuation = self
            .tokenizer
            .decode(&tokens[prompt_len..], true)
            .map_err(|e| InferenceError::Tokenizer(e.to_string()))?;

        Ok(Generation {
            text: format!("{prompt}{continuation}"),
            new_tokens: tokens.len() - prompt_len,
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Sharded checkpoints list their files in the index; small ones ship a single file
fn weight_files(repo: &ApiRepo) -> Result<Vec<PathBuf>, InferenceError> {
    let index_path = match repo.get("model.safetensors.index.json") {
        Ok(path) => path,
        Err(_) => return Ok(vec![repo.get("model.safetensors")?]),
    };

    let index: serde_json::Value = serde_json::from_slice(&fs::read(index_path)?)?;
    let shards = shard_names(&index)?;

    shards
        .iter()
        .map(|name| repo.get(name).map_err(InferenceError::from))
        .collect()
}

fn shard_names(index: &serde_json::Value) -> Result<BTreeSet<String>, InferenceError> {
    let weight_map = index["weight_map"].as_object().ok_or_else(|| {
        InferenceError::Model("model.safetensors.index.json has no weight_map".to_string())
    })?;

    weight_map
        .values()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                InferenceError::Model(format!("invalid shard entry in weight_map: {v}"))
            })
        })
        .collect()
}

fn eos_ids(declared: Option<&LlamaEosToks>, lookup: impl Fn(&str) -> Option<u32>) -> Vec<u32> {
    match declared {
        Some(LlamaEosToks::Single(id)) => vec![*id],
        Some(LlamaEosToks::Multiple(ids)) => ids.clone(),
        None => FALLBACK_EOS.into_iter().filter_map(lookup).collect(),
    }
}

// max_length counts the prompt, like the transformers pipeline, which still
// samples one token when the prompt alone reaches the limit
fn new_token_budget(prompt_len: usize, max_length: usize) -> Result<usize, InferenceError> {
    if prompt_len == 0 {
        return Err(InferenceError::Model(
            "prompt encodes to zero tokens".to_string(),
        ));
    }
    Ok(max_length.saturating_sub(prompt_len).max(1))
}
