use std::sync::Arc;

use crate::inference::{GenerationParams, TextGenerator};
use crate::secret::SecretValidator;

// app's shared state, built once at startup and read by every request
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub secret: SecretValidator,
    pub params: GenerationParams,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        secret: SecretValidator,
        params: GenerationParams,
    ) -> Arc<Self> {
        Arc::new(Self {
            generator,
            secret,
            params,
        })
    }
}
