//! Provider registry — maps provider names to endpoint configurations.
//!
//! Every supported language-model backend speaks the OpenAI chat-completions
//! dialect; entries differ only by base URL, auth style and key variables.

/// How to attach auth credentials to requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// No authentication required (local servers).
    None,
}

/// Configuration for a single provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier.
    pub name: &'static str,
    /// Base URL for the API. Empty when it must come from config or env.
    pub base_url: &'static str,
    /// Path for chat completions endpoint (appended to base_url).
    pub chat_path: &'static str,
    /// Path probed by `health_check` for local servers.
    pub models_path: &'static str,
    /// Environment variable names to try for the API key (in order).
    pub env_keys: &'static [&'static str],
    /// How to send auth credentials.
    pub auth_style: AuthStyle,
    /// Environment variable to override the base URL (e.g., OLLAMA_HOST).
    pub base_url_env: Option<&'static str>,
    /// Suffix appended to a base URL taken from `base_url_env`.
    pub env_url_suffix: &'static str,
}

// ─── Provider Definitions ────────────────────────────────────────────────────

static PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        // Model serving endpoints: {host}/serving-endpoints/chat/completions,
        // with the endpoint name passed as `model`.
        name: "databricks",
        base_url: "",
        chat_path: "/chat/completions",
        models_path: "",
        env_keys: &["DATABRICKS_TOKEN"],
        auth_style: AuthStyle::Bearer,
        base_url_env: Some("DATABRICKS_HOST"),
        env_url_suffix: "/serving-endpoints",
    },
    ProviderConfig {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        chat_path: "/chat/completions",
        models_path: "/models",
        env_keys: &["OPENAI_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        env_url_suffix: "",
    },
    ProviderConfig {
        name: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        chat_path: "/chat/completions",
        models_path: "/models",
        env_keys: &["OPENROUTER_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        env_url_suffix: "",
    },
    ProviderConfig {
        name: "groq",
        base_url: "https://api.groq.com/openai/v1",
        chat_path: "/chat/completions",
        models_path: "/models",
        env_keys: &["GROQ_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        env_url_suffix: "",
    },
    ProviderConfig {
        name: "deepseek",
        base_url: "https://api.deepseek.com",
        chat_path: "/chat/completions",
        models_path: "/models",
        env_keys: &["DEEPSEEK_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        env_url_suffix: "",
    },
    ProviderConfig {
        name: "together",
        base_url: "https://api.together.xyz/v1",
        chat_path: "/chat/completions",
        models_path: "/models",
        env_keys: &["TOGETHER_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        env_url_suffix: "",
    },
    ProviderConfig {
        name: "ollama",
        base_url: "http://localhost:11434/v1",
        chat_path: "/chat/completions",
        models_path: "/models",
        env_keys: &[],
        auth_style: AuthStyle::None,
        base_url_env: Some("OLLAMA_HOST"),
        env_url_suffix: "/v1",
    },
    ProviderConfig {
        name: "vllm",
        base_url: "http://localhost:8000/v1",
        chat_path: "/chat/completions",
        models_path: "/models",
        env_keys: &["VLLM_API_KEY"],
        auth_style: AuthStyle::None,
        base_url_env: Some("VLLM_HOST"),
        env_url_suffix: "/v1",
    },
];

/// Look up a provider config by name.
pub fn get_provider_config(name: &str) -> Option<&'static ProviderConfig> {
    // Also match aliases
    let lookup = match name {
        "databricks-model-serving" | "chat_databricks" => "databricks",
        "together_ai" | "togetherai" => "together",
        other => other,
    };
    PROVIDERS.iter().find(|p| p.name == lookup)
}

/// List all known provider names.
pub fn all_provider_names() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_aliases() {
        assert_eq!(get_provider_config("openai").unwrap().name, "openai");
        assert_eq!(get_provider_config("chat_databricks").unwrap().name, "databricks");
        assert_eq!(get_provider_config("togetherai").unwrap().name, "together");
        assert!(get_provider_config("nonexistent").is_none());
    }

    #[test]
    fn test_databricks_needs_host() {
        let cfg = get_provider_config("databricks").unwrap();
        assert!(cfg.base_url.is_empty());
        assert_eq!(cfg.base_url_env, Some("DATABRICKS_HOST"));
        assert_eq!(cfg.auth_style, AuthStyle::Bearer);
    }

    #[test]
    fn test_names_unique() {
        let names = all_provider_names();
        let mut dedup = names.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(names.len(), dedup.len());
    }
}
