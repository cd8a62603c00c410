use std::sync::Arc;

use mitra_config::{ConfigError, ServerConfig};
use mitra_llm::{GeminiClient, PromptTemplate, TextGenerator};
use tracing::{info, warn};

pub struct ServerState {
    pub template: PromptTemplate,
    /// `None` when no API key is configured; every evaluation is then refused.
    pub generator: Option<Arc<dyn TextGenerator>>,
}

impl ServerState {
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let template = match config.load_prompt_template()? {
            Some(text) => {
                info!("Loaded prompt template from {:?}", config.prompt_template_path);
                PromptTemplate::new(text)
            }
            None => PromptTemplate::default(),
        };

        let generator = match &config.api_key {
            Some(key) => {
                let client = GeminiClient::new(key.clone(), config.model.clone(), config.api_base.clone());
                Some(Arc::new(client) as Arc<dyn TextGenerator>)
            }
            None => {
                warn!("API_KEY not configured; evaluation requests will be rejected");
                None
            }
        };

        Ok(Self { template, generator })
    }
}
