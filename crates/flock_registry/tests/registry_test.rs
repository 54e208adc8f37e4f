//! Tests for model/prompt registry lifecycle and secret validation.

use flock_core::{ModelSpec, PromptSpec, ProviderKind, Scope};
use flock_registry::{ModelRegistry, PromptRegistry, SecretManager};
use std::collections::HashMap;

#[test]
fn local_shadows_global_model() {
    let registry = ModelRegistry::new();
    registry
        .create(ModelSpec::new("judge", "gpt-4o", ProviderKind::OpenAi).with_scope(Scope::Global))
        .unwrap();
    registry
        .create(ModelSpec::new("judge", "llama3", ProviderKind::Ollama))
        .unwrap();

    let resolved = registry.resolve("judge").unwrap();
    assert_eq!(resolved.provider, ProviderKind::Ollama);
    assert_eq!(resolved.model, "llama3");

    // Removing the local definition uncovers the global one.
    registry.delete("judge");
    let resolved = registry.resolve("judge").unwrap();
    assert_eq!(resolved.provider, ProviderKind::OpenAi);
}

#[test]
fn duplicate_create_fails_but_cross_scope_is_allowed() {
    let registry = ModelRegistry::new();
    registry
        .create(ModelSpec::new("m", "gpt-4o-mini", ProviderKind::OpenAi))
        .unwrap();
    assert!(registry
        .create(ModelSpec::new("m", "gpt-4o", ProviderKind::OpenAi))
        .is_err());
    assert!(registry
        .create(ModelSpec::new("m", "gpt-4o", ProviderKind::OpenAi).with_scope(Scope::Global))
        .is_ok());
}

#[test]
fn update_moves_scope_in_place() {
    let registry = ModelRegistry::new();
    registry
        .create(ModelSpec::new("mover", "gpt-4o-mini", ProviderKind::OpenAi))
        .unwrap();
    registry
        .update(
            ModelSpec::new("mover", "gpt-4o-mini", ProviderKind::OpenAi).with_scope(Scope::Global),
        )
        .unwrap();

    let moved = registry.get("mover").unwrap();
    assert_eq!(moved.scope, Scope::Global);
}

#[test]
fn update_missing_fails_delete_missing_succeeds() {
    let registry = ModelRegistry::new();
    assert!(registry
        .update(ModelSpec::new("ghost", "gpt-4o", ProviderKind::OpenAi))
        .is_err());
    registry.delete("ghost");
    assert!(registry.get("ghost").is_none());
}

#[test]
fn default_models_are_seeded() {
    let registry = ModelRegistry::with_defaults();
    let default = registry.resolve("default").unwrap();
    assert_eq!(default.model, "gpt-4o-mini");
    assert_eq!(default.provider, ProviderKind::OpenAi);
    assert!(registry.get("text-embedding-3-small").is_some());
}

#[test]
fn prompt_lifecycle_mirrors_models() {
    let registry = PromptRegistry::new();
    registry
        .create(PromptSpec::new("greet", "Say hello to {{name}}"))
        .unwrap();
    assert!(registry.create(PromptSpec::new("greet", "other")).is_err());

    registry
        .update(PromptSpec::new("greet", "Wave at {{name}}"))
        .unwrap();
    assert_eq!(registry.get("greet").unwrap().content, "Wave at {{name}}");

    registry.delete("greet");
    registry.delete("greet");
    assert!(registry.resolve("greet").is_err());
}

#[test]
fn secret_requires_provider_fields() {
    let secrets = SecretManager::new();

    let missing = secrets.create_secret(
        "azure_main",
        ProviderKind::Azure,
        HashMap::from([("API_KEY".to_string(), "key".to_string())]),
    );
    let message = format!("{}", missing.unwrap_err());
    assert!(message.contains("RESOURCE_NAME"));

    let complete = secrets.create_secret(
        "azure_main",
        ProviderKind::Azure,
        HashMap::from([
            ("api_key".to_string(), "key".to_string()),
            ("resource_name".to_string(), "res".to_string()),
            ("api_version".to_string(), "2024-02-01".to_string()),
        ]),
    );
    assert!(complete.is_ok());

    // Keys are normalized to upper case.
    let stored = secrets.get_secret("azure_main").unwrap();
    assert_eq!(stored.get("API_KEY").map(String::as_str), Some("key"));
}

#[test]
fn resolve_falls_back_to_provider_default_name() {
    let secrets = SecretManager::new();
    secrets
        .create_secret(
            "__default_ollama",
            ProviderKind::Ollama,
            HashMap::from([("API_URL".to_string(), "http://localhost:11434".to_string())]),
        )
        .unwrap();

    let bound = secrets.resolve(ProviderKind::Ollama, None);
    assert_eq!(
        bound.get("API_URL").map(String::as_str),
        Some("http://localhost:11434")
    );

    // Unknown secrets resolve to an empty map, not an error.
    assert!(secrets.resolve(ProviderKind::OpenAi, Some("nope")).is_empty());
}
