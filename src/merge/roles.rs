/// Role-title dictionary.
///
/// The Korean-to-English table below is domain data, not behavior: the
/// engine only ever looks entries up, and a caller can replace the whole
/// table. No entries beyond the configured set are ever inferred.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Built-in dictionary of common Korean organizational titles.
static DEFAULT_ROLES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "회장" => "Chairman",
    "부회장" => "Vice Chairman",
    "사장" => "President",
    "부사장" => "Executive Vice President",
    "대표이사" => "Chief Executive Officer",
    "전무" => "Senior Managing Director",
    "상무" => "Managing Director",
    "이사" => "Director",
    "감사" => "Auditor",
    "고문" => "Advisor",
    "본부장" => "Division Head",
    "실장" => "Office Manager",
    "팀장" => "Team Leader",
    "부장" => "General Manager",
    "차장" => "Deputy General Manager",
    "과장" => "Manager",
    "대리" => "Assistant Manager",
    "주임" => "Senior Staff",
    "사원" => "Staff",
    "연구원" => "Researcher",
};

/// Lookup table mapping role titles to their English equivalents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleDictionary {
    /// Replacement table; `None` means the built-in default set
    entries: Option<HashMap<String, String>>,
}

impl RoleDictionary {
    /// A dictionary backed entirely by the given table.
    pub fn with_entries(entries: HashMap<String, String>) -> Self {
        Self {
            entries: Some(entries),
        }
    }

    /// Look up the English equivalent of a role title.
    pub fn lookup(&self, role: &str) -> Option<&str> {
        let key = role.trim();
        if key.is_empty() {
            return None;
        }
        match &self.entries {
            Some(table) => table.get(key).map(String::as_str),
            None => DEFAULT_ROLES.get(key).copied(),
        }
    }
}
