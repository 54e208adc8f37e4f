//! Provider credential storage.

use flock_core::ProviderKind;
use flock_error::{FlockResult, RegistryError, RegistryErrorKind};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};

/// Named credential sets consumed by provider adapters at call time.
///
/// Each provider has its own required fields:
///
/// | provider  | required                               | optional      |
/// |-----------|----------------------------------------|---------------|
/// | openai    | `API_KEY`                              | `API_URL`     |
/// | azure     | `API_KEY`, `RESOURCE_NAME`, `API_VERSION` |            |
/// | ollama    | `API_URL`                              |               |
/// | anthropic | `API_KEY`                              | `API_VERSION` |
///
/// # Examples
///
/// ```
/// use flock_core::ProviderKind;
/// use flock_registry::SecretManager;
/// use std::collections::HashMap;
///
/// let secrets = SecretManager::new();
/// let fields = HashMap::from([("API_KEY".to_string(), "sk-test".to_string())]);
/// secrets
///     .create_secret("my_openai", ProviderKind::OpenAi, fields)
///     .unwrap();
/// assert!(secrets.get_secret("my_openai").is_some());
/// ```
pub struct SecretManager {
    secrets: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl SecretManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            secrets: RwLock::new(HashMap::new()),
        }
    }

    /// The fields a provider refuses to run without.
    pub fn required_fields(provider: ProviderKind) -> &'static [&'static str] {
        match provider {
            ProviderKind::OpenAi => &["API_KEY"],
            ProviderKind::Azure => &["API_KEY", "RESOURCE_NAME", "API_VERSION"],
            ProviderKind::Ollama => &["API_URL"],
            ProviderKind::Anthropic => &["API_KEY"],
        }
    }

    /// The secret name bound when a call does not name one explicitly.
    pub fn default_secret_name(provider: ProviderKind) -> String {
        match provider {
            ProviderKind::Azure => "__default_azure_llm".to_string(),
            other => format!("__default_{other}"),
        }
    }

    /// `CREATE SECRET` — validates provider-required fields, upper-cases
    /// keys, and replaces any existing secret of the same name.
    pub fn create_secret(
        &self,
        name: &str,
        provider: ProviderKind,
        fields: HashMap<String, String>,
    ) -> FlockResult<()> {
        let normalized: HashMap<String, String> = fields
            .into_iter()
            .map(|(key, value)| (key.to_uppercase(), value))
            .collect();

        for required in Self::required_fields(provider) {
            if !normalized.contains_key(*required) {
                return Err(RegistryError::new(RegistryErrorKind::MissingSecretField(
                    provider.to_string(),
                    (*required).to_string(),
                )))?;
            }
        }

        debug!(name, provider = %provider, "Storing secret");
        self.secrets
            .write()
            .expect("secret lock poisoned")
            .insert(name.to_string(), normalized);
        Ok(())
    }

    /// Fetch a secret by name.
    pub fn get_secret(&self, name: &str) -> Option<HashMap<String, String>> {
        self.secrets
            .read()
            .expect("secret lock poisoned")
            .get(name)
            .cloned()
    }

    /// Credentials for a call: the explicitly named secret, or the
    /// provider's default. An absent secret yields an empty map — the
    /// adapter reports the missing authentication when it needs a field.
    pub fn resolve(
        &self,
        provider: ProviderKind,
        secret_name: Option<&str>,
    ) -> HashMap<String, String> {
        let name = secret_name
            .map(str::to_string)
            .unwrap_or_else(|| Self::default_secret_name(provider));
        self.get_secret(&name).unwrap_or_default()
    }

    /// Seed default secrets from the process environment (and `.env`).
    ///
    /// Recognized variables: `OPENAI_API_KEY`, `OPENAI_API_URL`,
    /// `AZURE_API_KEY`/`AZURE_RESOURCE_NAME`/`AZURE_API_VERSION`,
    /// `OLLAMA_API_URL`, `ANTHROPIC_API_KEY`/`ANTHROPIC_API_VERSION`.
    pub fn load_env(&self) {
        dotenvy::dotenv().ok();

        let mut seeded = 0usize;
        let groups: [(ProviderKind, &[(&str, &str)]); 4] = [
            (
                ProviderKind::OpenAi,
                &[("OPENAI_API_KEY", "API_KEY"), ("OPENAI_API_URL", "API_URL")],
            ),
            (
                ProviderKind::Azure,
                &[
                    ("AZURE_API_KEY", "API_KEY"),
                    ("AZURE_RESOURCE_NAME", "RESOURCE_NAME"),
                    ("AZURE_API_VERSION", "API_VERSION"),
                ],
            ),
            (ProviderKind::Ollama, &[("OLLAMA_API_URL", "API_URL")]),
            (
                ProviderKind::Anthropic,
                &[
                    ("ANTHROPIC_API_KEY", "API_KEY"),
                    ("ANTHROPIC_API_VERSION", "API_VERSION"),
                ],
            ),
        ];

        for (provider, mapping) in groups {
            let mut fields = HashMap::new();
            for (var, key) in mapping {
                if let Ok(value) = std::env::var(var) {
                    fields.insert((*key).to_string(), value);
                }
            }
            if fields.is_empty() {
                continue;
            }
            let name = Self::default_secret_name(provider);
            if self.create_secret(&name, provider, fields).is_ok() {
                seeded += 1;
            }
        }

        if seeded > 0 {
            info!(count = seeded, "Seeded default secrets from environment");
        }
    }
}

impl Default for SecretManager {
    fn default() -> Self {
        Self::new()
    }
}
