use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

/// Built-in catalogue: name, provider, capabilities. Order matters; the
/// first model with a capability is that capability's default.
const CATALOGUE: &[(&str, &str, &[&str])] = &[
    ("gemini-2.0-flash", "gemini", &["text", "vision"]),
    ("gemini-1.5-flash", "gemini", &["text", "vision"]),
    ("gemini-2.5-flash", "gemini", &["text", "vision"]),
    (
        "gemini-2.0-flash-preview-image-generation",
        "gemini",
        &["image", "edit"],
    ),
    ("imagen-3.0-generate-001", "imagen", &["image"]),
    ("imagen-4.0-generate-001", "imagen", &["image"]),
    ("dryrun-image-1", "dryrun", &["image", "edit"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<String>,
}

impl ModelSpec {
    pub fn new(name: &str, provider: &str, capabilities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            provider: provider.to_string(),
            capabilities: capabilities.iter().map(|item| (*item).to_string()).collect(),
        }
    }

    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }
}

/// Why a resolution landed on a different model than the one asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    Unspecified,
    Unknown(String),
    Unsupported(String),
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::Unspecified => f.write_str("no model named"),
            Fallback::Unknown(name) => write!(f, "'{name}' is not a known model"),
            Fallback::Unsupported(name) => write!(f, "'{name}' lacks the capability"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub model: ModelSpec,
    pub fallback: Option<Fallback>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no model supports capability '{0}'")]
pub struct NoCapableModel(pub String);

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_models(
            CATALOGUE
                .iter()
                .map(|(name, provider, capabilities)| ModelSpec::new(name, provider, capabilities)),
        )
    }
}

impl ModelRegistry {
    pub fn with_models(models: impl IntoIterator<Item = ModelSpec>) -> Self {
        Self {
            models: models
                .into_iter()
                .map(|model| (model.name.clone(), model))
                .collect(),
        }
    }

    /// Accepts the API's `models/` resource prefix.
    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name.trim().trim_start_matches("models/"))
    }

    pub fn default_for(&self, capability: &str) -> Option<&ModelSpec> {
        self.models.values().find(|model| model.supports(capability))
    }

    /// Returns the requested model when it can serve `capability`, otherwise
    /// the capability default together with the reason for the substitution.
    pub fn resolve(
        &self,
        requested: Option<&str>,
        capability: &str,
    ) -> Result<Resolved, NoCapableModel> {
        let requested = requested.map(str::trim).filter(|name| !name.is_empty());
        let fallback = match requested.map(|name| (name, self.get(name))) {
            Some((_, Some(model))) if model.supports(capability) => {
                return Ok(Resolved {
                    model: model.clone(),
                    fallback: None,
                });
            }
            Some((name, Some(_))) => Fallback::Unsupported(name.to_string()),
            Some((name, None)) => Fallback::Unknown(name.to_string()),
            None => Fallback::Unspecified,
        };
        let model = self
            .default_for(capability)
            .ok_or_else(|| NoCapableModel(capability.to_string()))?;
        Ok(Resolved {
            model: model.clone(),
            fallback: Some(fallback),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capable_model_resolves_to_itself() {
        let resolved = ModelRegistry::default().resolve(Some("models/gemini-1.5-flash"), "vision");
        assert_eq!(
            resolved.map(|r| (r.model.name, r.fallback)),
            Ok(("gemini-1.5-flash".to_string(), None))
        );
    }

    #[test]
    fn fallbacks_name_their_reason() {
        let registry = ModelRegistry::default();

        let unknown = registry.resolve(Some("gpt-4o"), "text").map(|r| r.fallback);
        assert_eq!(unknown, Ok(Some(Fallback::Unknown("gpt-4o".to_string()))));

        let unsupported = registry
            .resolve(Some("imagen-3.0-generate-001"), "edit")
            .map(|r| (r.model.name, r.fallback));
        assert_eq!(
            unsupported,
            Ok((
                "gemini-2.0-flash-preview-image-generation".to_string(),
                Some(Fallback::Unsupported("imagen-3.0-generate-001".to_string()))
            ))
        );

        let unspecified = registry.resolve(Some("  "), "image").map(|r| r.fallback);
        assert_eq!(unspecified, Ok(Some(Fallback::Unspecified)));
    }

    #[test]
    fn capability_without_models_is_an_error() {
        let registry = ModelRegistry::with_models([ModelSpec::new("only-text", "gemini", &["text"])]);
        assert_eq!(
            registry.resolve(Some("only-text"), "image"),
            Err(NoCapableModel("image".to_string()))
        );
        assert_eq!(
            registry.default_for("text").map(|model| model.name.as_str()),
            Some("only-text")
        );
    }
}
