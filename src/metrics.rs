use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Histogram, TextEncoder, register_counter, register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("textgen_requests_total", "Total number of generate requests").unwrap();
    pub static ref AUTH_FAILURES: Counter =
        register_counter!("textgen_auth_failures_total", "Requests rejected for a bad secret").unwrap();
    pub static ref INFERENCE_FAILURES: Counter =
        register_counter!("textgen_inference_failures_total", "Requests where the model failed").unwrap();
    pub static ref GENERATED_TOKENS: Counter =
        register_counter!("textgen_generated_tokens_total", "Tokens sampled by the model").unwrap();
    pub static ref GENERATION_LATENCY: Histogram = register_histogram!(
        "textgen_generation_latency_seconds",
        "Model inference latency in seconds",
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();
}

// Prometheus text exposition of the default registry
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
