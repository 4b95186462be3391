pub mod llama;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::InferenceError;

pub use llama::LlamaGenerator;

// Sampling settings shared by every request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_length: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub seed: Option<u64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_length: 50,
            temperature: 0.6,
            top_p: 0.9,
            seed: None,
        }
    }
}

impl GenerationParams {
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    // prompt followed by the sampled continuation
    pub text: String,
    pub new_tokens: usize,
}

// A loaded model that can continue a prompt.
// Shared across requests behind an Arc and called from the blocking pool.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str, params: &GenerationParams)
    -> Result<Generation, InferenceError>;

    fn model_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_seed_is_reused() {
        let params = GenerationParams {
            seed: Some(7),
            ..Default::default()
        };
        assert_eq!(params.seed(), 7);
        assert_eq!(params.seed(), 7);
    }

    #[test]
    fn defaults_follow_pipeline_settings() {
        let params = GenerationParams::default();
        assert_eq!(params.max_length, 50);
        assert!(params.temperature > 0.0);
        assert!(params.top_p <= 1.0);
    }
}
