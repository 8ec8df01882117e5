//! LLM provider implementations for QA Copilot.
//!
//! All providers implement the `qacopilot_core::Provider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;

use qacopilot_config::AppConfig;
use qacopilot_core::error::ProviderError;
use qacopilot_core::provider::Provider;
use std::sync::Arc;

/// Build the configured provider.
///
/// Fails with `NotConfigured` when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ProviderError::NotConfigured("no Anthropic API key".into()))?;

    let mut provider = AnthropicProvider::new(api_key)?;
    if let Some(url) = &config.api_url {
        provider = provider.with_base_url(url);
    }

    Ok(Arc::new(provider))
}
