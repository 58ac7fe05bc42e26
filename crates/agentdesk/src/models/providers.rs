//! Static provider and model tables.

use super::types::ModelDescriptor;

pub const ANTHROPIC: &str = "anthropic";
pub const OPENAI: &str = "openai";
pub const GOOGLE: &str = "google";
pub const OLLAMA_CLOUD: &str = "ollama-cloud";
pub const OLLAMA_LOCAL: &str = "ollama-local";

#[derive(Debug, Clone, Copy)]
pub struct Provider {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub requires_api_key: bool,
}

pub const PROVIDERS: &[Provider] = &[
    Provider {
        id: ANTHROPIC,
        name: "Anthropic",
        description: "Claude models via the Anthropic API",
        requires_api_key: true,
    },
    Provider {
        id: OPENAI,
        name: "OpenAI",
        description: "GPT models via the OpenAI API",
        requires_api_key: true,
    },
    Provider {
        id: GOOGLE,
        name: "Google",
        description: "Gemini models via the Google AI API",
        requires_api_key: true,
    },
    Provider {
        id: OLLAMA_CLOUD,
        name: "Ollama Cloud",
        description: "Hosted open-weight models on ollama.com",
        requires_api_key: true,
    },
    Provider {
        id: OLLAMA_LOCAL,
        name: "Ollama (local)",
        description: "Models served by a local Ollama instance",
        requires_api_key: false,
    },
];

pub fn find_provider(id: &str) -> Option<&'static Provider> {
    PROVIDERS.iter().find(|p| p.id == id)
}

/// Static placeholders are replaced by discovery results for both Ollama
/// providers once either source returns anything.
pub fn is_ollama_provider(provider_id: &str) -> bool {
    provider_id == OLLAMA_LOCAL || provider_id == OLLAMA_CLOUD
}

#[derive(Debug, Clone, Copy)]
struct StaticModel {
    id: &'static str,
    display_name: &'static str,
    provider_id: &'static str,
    model_identifier: &'static str,
    description: &'static str,
}

const STATIC_MODELS: &[StaticModel] = &[
    StaticModel {
        id: "claude-sonnet-4-5",
        display_name: "Claude Sonnet 4.5",
        provider_id: ANTHROPIC,
        model_identifier: "claude-sonnet-4-5",
        description: "Balanced model for coding and agent work",
    },
    StaticModel {
        id: "claude-opus-4-1",
        display_name: "Claude Opus 4.1",
        provider_id: ANTHROPIC,
        model_identifier: "claude-opus-4-1",
        description: "Most capable Claude model for complex tasks",
    },
    StaticModel {
        id: "claude-haiku-4-5",
        display_name: "Claude Haiku 4.5",
        provider_id: ANTHROPIC,
        model_identifier: "claude-haiku-4-5",
        description: "Fast, low-cost Claude model",
    },
    StaticModel {
        id: "gpt-5",
        display_name: "GPT-5",
        provider_id: OPENAI,
        model_identifier: "gpt-5",
        description: "OpenAI flagship reasoning model",
    },
    StaticModel {
        id: "gpt-5-mini",
        display_name: "GPT-5 mini",
        provider_id: OPENAI,
        model_identifier: "gpt-5-mini",
        description: "Smaller, faster GPT-5",
    },
    StaticModel {
        id: "gemini-2.5-pro",
        display_name: "Gemini 2.5 Pro",
        provider_id: GOOGLE,
        model_identifier: "gemini-2.5-pro",
        description: "Google's most capable Gemini model",
    },
    StaticModel {
        id: "gemini-2.5-flash",
        display_name: "Gemini 2.5 Flash",
        provider_id: GOOGLE,
        model_identifier: "gemini-2.5-flash",
        description: "Fast Gemini model",
    },
    StaticModel {
        id: "ollama-cloud-gpt-oss-120b",
        display_name: "GPT OSS 120B",
        provider_id: OLLAMA_CLOUD,
        model_identifier: "gpt-oss:120b",
        description: "Open-weight GPT model hosted on Ollama Cloud",
    },
    StaticModel {
        id: "ollama-cloud-qwen3-coder-480b",
        display_name: "Qwen3 Coder 480B",
        provider_id: OLLAMA_CLOUD,
        model_identifier: "qwen3-coder:480b",
        description: "Qwen3 Coder hosted on Ollama Cloud",
    },
    StaticModel {
        id: "ollama-local-llama3.2",
        display_name: "Llama 3.2",
        provider_id: OLLAMA_LOCAL,
        model_identifier: "llama3.2",
        description: "Run `ollama pull llama3.2` to use locally",
    },
    StaticModel {
        id: "ollama-local-qwen2.5-coder",
        display_name: "Qwen 2.5 Coder",
        provider_id: OLLAMA_LOCAL,
        model_identifier: "qwen2.5-coder",
        description: "Run `ollama pull qwen2.5-coder` to use locally",
    },
];

/// Fresh copies of the static model table, all marked unavailable.
pub fn static_models() -> Vec<ModelDescriptor> {
    STATIC_MODELS
        .iter()
        .map(|m| ModelDescriptor {
            id: m.id.to_string(),
            display_name: m.display_name.to_string(),
            provider_id: m.provider_id.to_string(),
            model_identifier: m.model_identifier.to_string(),
            description: m.description.to_string(),
            available: false,
            source_mode: None,
        })
        .collect()
}
