use std::sync::Arc;

mod model;
mod provider;
mod rig_adapter;

pub use model::{DEFAULT_GEMINI_MODEL, Model, default_gemini_models, resolve_model};
pub use provider::{
    BoxFuture, ChatSession, LlmProvider, ProviderConfig, ProviderError, ProviderMessage,
    ProviderResult, Role, SessionConfig,
};
pub use rig_adapter::{RIG_GEMINI_PROVIDER_ID, RigChatSession, RigProviderAdapter};

pub fn create_provider(mut config: ProviderConfig) -> ProviderResult<Arc<dyn LlmProvider>> {
    if config.provider_id.trim().is_empty() {
        config.provider_id = RIG_GEMINI_PROVIDER_ID.to_string();
    }

    match config.provider_id.as_str() {
        "gemini" | "google" | "rig-gemini" => {
            config.provider_id = RIG_GEMINI_PROVIDER_ID.to_string();
            Ok(Arc::new(RigProviderAdapter::new(config)?))
        }
        _ => Err(ProviderError::UnsupportedProvider {
            stage: "create-provider",
            provider_id: config.provider_id,
        }),
    }
}
