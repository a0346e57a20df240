//! Composite item identifier codec
//!
//! Every projected item carries a globally unique id encoding the factory
//! that produced it, the repository it lives in and the native document
//! reference. The codec here is the only place these ids are built or
//! parsed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator between the factory, repository and native id segments.
const SEGMENT_SEPARATOR: char = '/';

/// Globally unique identifier of a projected item.
///
/// Valid ids match the `factoryName/repositoryName/nativeId` pattern and
/// round-trip through [`ItemId::decode`] without loss. The synthetic
/// top-level folder uses the special `factoryName/` shape which is only
/// recognized by the top-level factory itself, never by the codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

/// The three segments of a decoded item id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedId {
    pub factory_name: String,
    pub repository_name: String,
    pub native_id: String,
}

impl ItemId {
    /// Encode a `(factory, repository, nativeId)` triple into an item id.
    pub fn encode(factory_name: &str, repository_name: &str, native_id: &str) -> Self {
        let mut id = String::with_capacity(
            factory_name.len() + repository_name.len() + native_id.len() + 2,
        );
        id.push_str(factory_name);
        id.push(SEGMENT_SEPARATOR);
        id.push_str(repository_name);
        id.push(SEGMENT_SEPARATOR);
        id.push_str(native_id);
        Self(id)
    }

    /// The id of the synthetic top-level folder produced by the given
    /// factory. Deliberately not a codec-valid id.
    pub fn top_level(factory_name: &str) -> Self {
        Self(format!("{factory_name}{SEGMENT_SEPARATOR}"))
    }

    /// Decode an id back into its three segments.
    ///
    /// Fails unless splitting on `/` yields exactly three non-empty
    /// segments.
    pub fn decode(id: &str) -> Result<DecodedId> {
        let segments: Vec<&str> = id.split(SEGMENT_SEPARATOR).collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(Error::MalformedId { id: id.to_string() });
        }
        Ok(DecodedId {
            factory_name: segments[0].to_string(),
            repository_name: segments[1].to_string(),
            native_id: segments[2].to_string(),
        })
    }

    /// Decode this id.
    pub fn decoded(&self) -> Result<DecodedId> {
        Self::decode(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DecodedId {
    /// Re-encode the decoded segments.
    pub fn encode(&self) -> ItemId {
        ItemId::encode(&self.factory_name, &self.repository_name, &self.native_id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
