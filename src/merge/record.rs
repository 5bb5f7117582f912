/// Contact records consumed by the merge engine.
use crate::merge::roles::RoleDictionary;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A flat contact record.
///
/// Only `name` is mandatory; every other field defaults to empty. `extra`
/// carries open-ended template tokens matched case-insensitively. Records
/// are produced by an ingestion collaborator and read-only to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    /// Recipient name; a record without one is not processable
    pub name: String,

    /// Romanized/English name
    #[serde(default)]
    pub name_en: String,

    #[serde(default)]
    pub organization: String,

    /// Role/title in the source language
    #[serde(default)]
    pub role: String,

    /// Explicit English role; when empty the dictionary lookup applies
    #[serde(default)]
    pub role_en: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    /// Internal line / representative number
    #[serde(default)]
    pub extension: String,

    #[serde(default)]
    pub mobile: String,

    #[serde(default)]
    pub fax: String,

    /// Additional named fields for custom template tokens
    #[serde(default)]
    pub extra: HashMap<String, String>,

    /// Derived English role, memoized on first resolution
    #[serde(skip)]
    derived_role_en: OnceCell<String>,
}

impl Record {
    /// A record with just a name, for building up in tests and callers.
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the record satisfies the mandatory-name invariant.
    pub fn is_processable(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Case-insensitive lookup in the open field mapping.
    pub fn custom(&self, token: &str) -> Option<&str> {
        let wanted = token.to_lowercase();
        self.extra
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, value)| value.as_str())
    }

    /// The English role, derived once and memoized.
    ///
    /// Resolution: explicit `role_en` field, else the dictionary entry for
    /// `role`, else the original `role` value. The memo keeps repeated
    /// token resolutions and line-removal checks consistent.
    pub fn resolved_role_en(&self, dictionary: &RoleDictionary) -> &str {
        self.derived_role_en.get_or_init(|| {
            let explicit = self.role_en.trim();
            if !explicit.is_empty() {
                return explicit.to_string();
            }
            match dictionary.lookup(&self.role) {
                Some(english) => english.to_string(),
                None => self.role.trim().to_string(),
            }
        })
    }
}
