use crate::patterns::PhonePolicy;
use crate::safety::DEFAULT_FALLBACK_REPLY;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LureConfig {
    pub llm: LlmConfig,
    pub engagement: EngagementConfig,
    pub safety: SafetyConfig,
    pub extraction: ExtractionConfig,
}

impl LureConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: LureConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(key) = ["LLM_API_KEY", "GROQ_API_KEY", "OPENAI_API_KEY"]
            .iter()
            .find_map(|k| std::env::var(k).ok().filter(|v| !v.trim().is_empty()))
        {
            self.llm.api_key = Some(key);
        }
        if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(n) = v.parse() {
                self.llm.temperature = n;
            }
        }
        if let Ok(v) = std::env::var("LURE_MAX_MESSAGES") {
            if let Ok(n) = v.parse() {
                self.engagement.max_messages = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// openai | groq | deepseek | ollama | mock | none
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// HTTP timeout per external call. No retries are made.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            base_url: None,
            api_key: None,
            max_tokens: 500,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

// Keep the API key out of logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Once the history reaches this many messages the strategy wraps up.
    pub max_messages: usize,
    /// Messages of history shown to the persona model.
    pub persona_window: usize,
    /// Messages of history shown to the notes model.
    pub notes_window: usize,
    /// Messages of history shown to the detection model.
    pub detection_window: usize,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            max_messages: 20,
            persona_window: 8,
            notes_window: 10,
            detection_window: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub forbidden_phrases: Vec<String>,
    pub fallback_reply: String,
    pub block_payment_instructions: bool,
    pub block_numeric_disclosure: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            forbidden_phrases: default_forbidden_phrases(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            block_payment_instructions: true,
            block_numeric_disclosure: true,
        }
    }
}

fn default_forbidden_phrases() -> Vec<String> {
    [
        // self-disclosure
        "I am an AI",
        "I'm an AI",
        "I'm a bot",
        "I'm a system",
        "language model",
        "automated",
        "algorithm",
        "rule-based",
        // meta-awareness
        "honeypot",
        "detection system",
        "scam detection",
        "I'm detecting",
        "I'm analyzing",
        "intelligence",
        "extracted",
        "confidence score",
        "we've already",
        "we have gathered",
        "our system",
        "the system",
        "detection",
        "analysis",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub phone: PhonePolicy,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let cfg = LureConfig::default();
        assert_eq!(cfg.llm.provider, "groq");
        assert_eq!(cfg.llm.timeout_secs, 30);
        assert_eq!(cfg.engagement.max_messages, 20);
        assert_eq!(cfg.engagement.persona_window, 8);
        assert_eq!(cfg.safety.fallback_reply, DEFAULT_FALLBACK_REPLY);
        assert_eq!(cfg.extraction.phone.country_code, "91");
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[llm]
provider = "deepseek"
model = "deepseek-chat"
"#;
        let cfg: LureConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.llm.provider, "deepseek");
        assert_eq!(cfg.llm.model, "deepseek-chat");
        // Defaults for unspecified fields
        assert_eq!(cfg.llm.max_tokens, 500);
        assert!(cfg.safety.block_numeric_disclosure);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"
base_url = "https://api.openai.com/v1"
max_tokens = 800
temperature = 0.2
timeout_secs = 5

[engagement]
max_messages = 12
persona_window = 4
notes_window = 6
detection_window = 2

[safety]
forbidden_phrases = ["robot"]
fallback_reply = "Sorry, what?"
block_payment_instructions = false

[extraction.phone]
country_code = "44"
national_digits = 10
mobile_leading = "7"
"#;
        let cfg: LureConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.timeout_secs, 5);
        assert_eq!(cfg.engagement.max_messages, 12);
        assert_eq!(cfg.safety.forbidden_phrases, vec!["robot".to_string()]);
        assert!(!cfg.safety.block_payment_instructions);
        assert!(cfg.safety.block_numeric_disclosure);
        assert_eq!(cfg.extraction.phone.country_code, "44");
        assert_eq!(cfg.extraction.phone.mobile_leading, "7");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engagement]\nmax_messages = 3").unwrap();
        let cfg = LureConfig::load(file.path()).unwrap();
        assert_eq!(cfg.engagement.max_messages, 3);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm\nprovider = ").unwrap();
        assert!(LureConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("LLM_PROVIDER", "ollama");
        std::env::set_var("LLM_MODEL", "qwen2.5:7b");

        let mut cfg = LureConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.llm.provider, "ollama");
        assert_eq!(cfg.llm.model, "qwen2.5:7b");

        // Clean up env vars before testing defaults
        std::env::remove_var("LLM_PROVIDER");
        std::env::remove_var("LLM_MODEL");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = LureConfig::load_or_default("/nonexistent/path.toml");
        assert_eq!(cfg.llm.provider, "groq");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let cfg = LlmConfig {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let out = format!("{:?}", cfg);
        assert!(!out.contains("sk-secret"));
        assert!(out.contains("***"));
    }
}
