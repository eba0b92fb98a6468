//! Entities read from the input table and the per-entity resolution result.

use serde::Serialize;
use std::fmt;

/// Width entity codes are zero-padded to before a portal lookup.
pub const ENTITY_CODE_WIDTH: usize = 5;

/// How an entity is identified for site lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EntityKey {
    /// Free-text identification for the search-API strategy
    NameAddress { name: String, address: String },
    /// Normalized entity code for the portal strategy
    Code(String),
}

/// One school to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    /// Human readable name, also the source of the logo filename
    pub display_name: String,
    pub key: EntityKey,
}

impl Entity {
    pub fn with_address(name: &str, address: &str) -> Self {
        let name = name.trim().to_string();
        Self {
            display_name: name.clone(),
            key: EntityKey::NameAddress {
                name,
                address: address.trim().to_string(),
            },
        }
    }

    pub fn with_code(name: &str, code: &str) -> Self {
        Self {
            display_name: name.trim().to_string(),
            key: EntityKey::Code(normalize_entity_code(code)),
        }
    }

    /// Search query text for the name/address strategy
    pub fn search_query(&self) -> Option<String> {
        match &self.key {
            EntityKey::NameAddress { name, address } => {
                let query = format!("{} {}", name, address);
                let query = query.trim();
                if query.is_empty() {
                    None
                } else {
                    Some(query.to_string())
                }
            }
            EntityKey::Code(_) => None,
        }
    }

    pub fn entity_code(&self) -> Option<&str> {
        match &self.key {
            EntityKey::Code(code) => Some(code.as_str()),
            EntityKey::NameAddress { .. } => None,
        }
    }
}

/// Trim and left-pad an entity code with `0` to [`ENTITY_CODE_WIDTH`].
/// Longer codes are passed through untouched.
pub fn normalize_entity_code(raw: &str) -> String {
    let code = raw.trim();
    format!("{:0>width$}", code, width = ENTITY_CODE_WIDTH)
}

/// Outcome written to the `Logo Status` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogoStatus {
    #[serde(rename = "Found")]
    Found,
    #[serde(rename = "Not Found")]
    NotFound,
    #[serde(rename = "No Website")]
    NoWebsite,
    #[serde(rename = "Already Exists")]
    AlreadyExists,
}

impl LogoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoStatus::Found => "Found",
            LogoStatus::NotFound => "Not Found",
            LogoStatus::NoWebsite => "No Website",
            LogoStatus::AlreadyExists => "Already Exists",
        }
    }

    pub const ALL: [LogoStatus; 4] = [
        LogoStatus::Found,
        LogoStatus::NotFound,
        LogoStatus::NoWebsite,
        LogoStatus::AlreadyExists,
    ];
}

impl fmt::Display for LogoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one entity through the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    pub entity: Entity,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub status: LogoStatus,
}

impl ResolutionResult {
    pub fn no_website(entity: Entity) -> Self {
        Self {
            entity,
            website_url: None,
            logo_url: None,
            status: LogoStatus::NoWebsite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_codes_are_zero_padded() {
        assert_eq!(normalize_entity_code("1"), "00001");
        assert_eq!(normalize_entity_code("123"), "00123");
        assert_eq!(normalize_entity_code("0042"), "00042");
        assert_eq!(normalize_entity_code(""), "00000");
    }

    #[test]
    fn test_five_digit_codes_unchanged() {
        assert_eq!(normalize_entity_code("12345"), "12345");
        assert_eq!(normalize_entity_code("00007"), "00007");
    }

    #[test]
    fn test_long_codes_pass_through() {
        assert_eq!(normalize_entity_code("1234567"), "1234567");
    }

    #[test]
    fn test_codes_are_trimmed_before_padding() {
        assert_eq!(normalize_entity_code("  77 "), "00077");
    }

    #[test]
    fn test_normalized_length_is_always_five_for_short_input() {
        for len in 0..=ENTITY_CODE_WIDTH {
            let raw = "9".repeat(len);
            assert_eq!(normalize_entity_code(&raw).len(), ENTITY_CODE_WIDTH, "input {:?}", raw);
        }
    }

    #[test]
    fn test_search_query_joins_name_and_address() {
        let entity = Entity::with_address("  Lincoln Elementary ", " 12 Main St, Springfield ");
        assert_eq!(entity.display_name, "Lincoln Elementary");
        assert_eq!(
            entity.search_query().as_deref(),
            Some("Lincoln Elementary 12 Main St, Springfield")
        );
    }

    #[test]
    fn test_blank_search_query_is_none() {
        let entity = Entity::with_address("  ", "");
        assert_eq!(entity.search_query(), None);
    }

    #[test]
    fn test_code_entity_has_no_query() {
        let entity = Entity::with_code("Lincoln", "42");
        assert_eq!(entity.search_query(), None);
        assert_eq!(entity.entity_code(), Some("00042"));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(LogoStatus::Found.to_string(), "Found");
        assert_eq!(LogoStatus::NotFound.to_string(), "Not Found");
        assert_eq!(LogoStatus::NoWebsite.to_string(), "No Website");
        assert_eq!(LogoStatus::AlreadyExists.to_string(), "Already Exists");
    }
}
