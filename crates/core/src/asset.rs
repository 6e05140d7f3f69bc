//! Namespaced asset identifiers.
//!
//! Asset identifiers are stable string keys of the form `namespace:path`
//! (e.g. `minecraft:stone`, `veilcraft:ruby_pickaxe`). They identify items
//! and blocks across the registry, the wire layer, and persistence, so they
//! are validated at construction and ordered deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace used by the standard (client-known) asset catalogue.
pub const VANILLA_NAMESPACE: &str = "minecraft";

/// Error returned when parsing an invalid [`AssetId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AssetIdError {
    message: String,
}

impl AssetIdError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A namespaced identifier of the form `namespace:path`.
///
/// Ordering is lexical by `(namespace, path)` and is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId {
    namespace: String,
    path: String,
}

impl AssetId {
    /// Parse an asset identifier.
    ///
    /// Accepts either:
    /// - `namespace:path`
    /// - `path` (uses [`VANILLA_NAMESPACE`])
    pub fn parse(input: &str) -> Result<Self, AssetIdError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AssetIdError::new("AssetId cannot be empty"));
        }

        let (namespace, path) = match input.split_once(':') {
            Some((ns, p)) => (ns, p),
            None => (VANILLA_NAMESPACE, input),
        };

        validate_segment(namespace, "namespace")?;
        validate_segment(path, "path")?;

        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Shorthand for a `minecraft:`-namespaced identifier.
    pub fn vanilla(path: &str) -> Result<Self, AssetIdError> {
        validate_segment(path, "path")?;
        Ok(Self {
            namespace: VANILLA_NAMESPACE.to_string(),
            path: path.to_string(),
        })
    }

    /// Identifier namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Identifier path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether this identifier lives in the standard catalogue namespace.
    pub fn is_vanilla(&self) -> bool {
        self.namespace == VANILLA_NAMESPACE
    }
}

fn validate_segment(segment: &str, what: &str) -> Result<(), AssetIdError> {
    if segment.is_empty() {
        return Err(AssetIdError::new(format!("AssetId {what} cannot be empty")));
    }
    let valid = segment
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '/' | '.'));
    if !valid {
        return Err(AssetIdError::new(format!(
            "AssetId {what} `{segment}` contains invalid characters"
        )));
    }
    Ok(())
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for AssetId {
    type Err = AssetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetId {
    type Error = AssetIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespaced_id() {
        let id = AssetId::parse("veilcraft:ruby_pickaxe").unwrap();
        assert_eq!(id.namespace(), "veilcraft");
        assert_eq!(id.path(), "ruby_pickaxe");
        assert!(!id.is_vanilla());
    }

    #[test]
    fn bare_path_defaults_to_vanilla() {
        let id = AssetId::parse("stone").unwrap();
        assert_eq!(id.namespace(), VANILLA_NAMESPACE);
        assert!(id.is_vanilla());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(AssetId::parse("Veilcraft:Ruby").is_err());
        assert!(AssetId::parse("a b:c").is_err());
        assert!(AssetId::parse(":stone").is_err());
        assert!(AssetId::parse("").is_err());
    }

    #[test]
    fn display_roundtrips() {
        let id = AssetId::parse("minecraft:mushroom_stem").unwrap();
        assert_eq!(id.to_string(), "minecraft:mushroom_stem");
        assert_eq!(id.to_string().parse::<AssetId>().unwrap(), id);
    }

    #[test]
    fn ordering_is_lexical() {
        let a = AssetId::parse("a:z").unwrap();
        let b = AssetId::parse("b:a").unwrap();
        assert!(a < b);
    }
}
