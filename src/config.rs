use clap::Parser;

use crate::inference::GenerationParams;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "textgen-server")]
#[command(about = "Secret-gated text generation over HTTP")]
pub struct Args {
    // Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 7860)]
    pub port: u16,

    // Shared secret callers must send as {"secret": "..."}
    #[arg(short, long, env = "GENERATE_SECRET", default_value = "my-tds-project-secret", hide_env_values = true)]
    pub secret: String,

    // Hugging Face model repository
    #[arg(short, long, env = "MODEL_ID", default_value = "meta-llama/Llama-3.2-1B-Instruct")]
    pub model_id: String,

    #[arg(long, env = "MODEL_REVISION", default_value = "main")]
    pub revision: String,

    // Needed for gated repos such as Llama
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    // Total token budget, prompt included
    #[arg(long, env = "MAX_LENGTH", default_value_t = 50)]
    pub max_length: usize,

    #[arg(long, env = "TEMPERATURE", default_value_t = 0.6)]
    pub temperature: f64,

    #[arg(long, env = "TOP_P", default_value_t = 0.9)]
    pub top_p: f64,

    // Fixed sampling seed; a fresh one per request when unset
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,

    // Skip CUDA even when it is compiled in
    #[arg(long)]
    pub cpu: bool,
}

impl Args {
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_length: self.max_length,
            temperature: self.temperature,
            top_p: self.top_p,
            seed: self.seed,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
