//! Open, string-keyed enumerations populated at registration time
//!
//! Contexts (`File`, `Selection`, `Cell`), input extensions (`py`, `sh`) and
//! result formats (`text`, `image`) are not closed sets: providers and
//! executors introduce new ones when they register. Each registry maps a
//! display name to a stable identifier and is append-only.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::camel_case_to_snake_case;

/// Well-known context identifiers
pub mod run_context {
    pub const FILE: &str = "file";
    pub const CELL: &str = "cell";
    pub const SELECTION: &str = "selection";
}

/// Well-known result format identifiers
pub mod result_format {
    pub const NO_DISPLAY: &str = "no_display";
    pub const TEXT: &str = "text";
}

/// A display name plus an optional stable identifier.
///
/// When `identifier` is missing it is derived from the name in snake_case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedIdentifier {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// Run context declaration (`File`, `Selection`, `Cell`, ...)
pub type Context = NamedIdentifier;

/// Output format declaration (`Text`, `Image`, `Html`, ...)
pub type OutputFormat = NamedIdentifier;

impl NamedIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
        }
    }

    pub fn with_identifier(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: Some(identifier.into()),
        }
    }

    /// The stable identifier, derived from the name when not given
    pub fn id(&self) -> String {
        match &self.identifier {
            Some(id) => id.clone(),
            None => camel_case_to_snake_case(&self.name),
        }
    }

    /// Return a copy whose identifier is filled in
    pub fn resolved(&self) -> Self {
        Self {
            name: self.name.clone(),
            identifier: Some(self.id()),
        }
    }
}

/// Insertion-ordered map from display names to identifiers
#[derive(Debug, Clone)]
pub struct IdentifierRegistry {
    kind: &'static str,
    entries: IndexMap<String, String>,
}

impl IdentifierRegistry {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    /// Registry of run contexts with `File`, `Cell` and `Selection` present
    pub fn contexts() -> Self {
        let mut registry = Self::new("context");
        registry.entries.insert("File".into(), run_context::FILE.into());
        registry.entries.insert("Cell".into(), run_context::CELL.into());
        registry
            .entries
            .insert("Selection".into(), run_context::SELECTION.into());
        registry
    }

    /// Registry of result formats with `NoDisplay` present
    pub fn result_formats() -> Self {
        let mut registry = Self::new("result display format");
        registry
            .entries
            .insert("NoDisplay".into(), result_format::NO_DISPLAY.into());
        registry
    }

    /// Registry of input extensions, whose names are their identifiers
    pub fn extensions() -> Self {
        Self::new("input extension")
    }

    /// Add a name, returning its identifier.
    ///
    /// Re-adding a name is a no-op that returns the existing identifier.
    /// Re-adding it under a different explicit identifier is an error.
    pub fn add(&mut self, name: &str, identifier: Option<&str>) -> Result<String> {
        let wanted = match identifier {
            Some(id) => id.to_string(),
            None => camel_case_to_snake_case(name),
        };

        if let Some(existing) = self.entries.get(name) {
            if identifier.is_some() && *existing != wanted {
                return Err(Error::RegistryError(format!(
                    "{} '{}' is registered as '{}', cannot re-register it as '{}'",
                    self.kind, name, existing, wanted
                )));
            }
            return Ok(existing.clone());
        }

        tracing::debug!("Adding {} '{}' -> '{}'", self.kind, name, wanted);
        self.entries.insert(name.to_string(), wanted.clone());
        Ok(wanted)
    }

    /// Add a declaration and return its identifier
    pub fn add_named(&mut self, named: &NamedIdentifier) -> Result<String> {
        self.add(&named.name, named.identifier.as_deref())
    }

    /// Add a tag whose display name is its identifier (extensions)
    pub fn add_tag(&mut self, tag: &str) -> Result<String> {
        self.add(tag, Some(tag))
    }

    /// Attribute-style lookup by display name: `contexts.lookup("File")`
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Reverse lookup from an identifier to its display name
    pub fn name_of(&self, identifier: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, id)| id.as_str() == identifier)
            .map(|(name, _)| name.as_str())
    }

    pub fn contains_identifier(&self, identifier: &str) -> bool {
        self.entries.values().any(|id| id == identifier)
    }

    /// `(name, identifier)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contexts() {
        let contexts = IdentifierRegistry::contexts();
        assert_eq!(contexts.lookup("File"), Some("file"));
        assert_eq!(contexts.lookup("Selection"), Some("selection"));
        assert_eq!(contexts.name_of("cell"), Some("Cell"));
    }

    #[test]
    fn test_add_derives_identifier() {
        let mut formats = IdentifierRegistry::result_formats();
        let id = formats.add("RichText", None).unwrap();
        assert_eq!(id, "rich_text");
        assert_eq!(formats.lookup("RichText"), Some("rich_text"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut contexts = IdentifierRegistry::contexts();
        let before = contexts.len();
        assert_eq!(contexts.add("File", None).unwrap(), "file");
        assert_eq!(contexts.add("File", Some("file")).unwrap(), "file");
        assert_eq!(contexts.len(), before);
    }

    #[test]
    fn test_conflicting_identifier_is_an_error() {
        let mut contexts = IdentifierRegistry::contexts();
        let err = contexts.add("File", Some("document")).unwrap_err();
        assert!(matches!(err, Error::RegistryError(_)));
        assert_eq!(contexts.lookup("File"), Some("file"));
    }

    #[test]
    fn test_extension_tags_keep_order() {
        let mut extensions = IdentifierRegistry::extensions();
        extensions.add_tag("py").unwrap();
        extensions.add_tag("sh").unwrap();
        extensions.add_tag("py").unwrap();
        let ids: Vec<_> = extensions.iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec!["py", "sh"]);
    }

    #[test]
    fn test_named_identifier_resolution() {
        let ctx = Context::new("CodeBlock");
        assert_eq!(ctx.id(), "code_block");
        assert_eq!(ctx.resolved().identifier.as_deref(), Some("code_block"));

        let explicit = Context::with_identifier("Selection", "sel");
        assert_eq!(explicit.id(), "sel");
    }
}
