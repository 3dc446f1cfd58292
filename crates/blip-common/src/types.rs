//! Common type definitions and newtype wrappers for domain modeling.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{InsightsError, Result};

/// Identifier of a chatbot visitor (the contact identity, e.g.
/// `5511999999999@wa.gw.msging.net`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(String);

impl VisitorId {
    /// Build a visitor id, rejecting blank and placeholder values.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() || matches!(trimmed.to_ascii_lowercase().as_str(), "nan" | "none" | "null") {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A BLiP bot authorization key.
///
/// Held in memory only; `Debug` and `Display` never reveal it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Sanitize and wrap a key as typed or pasted by the operator.
    pub fn parse(raw: &str) -> Result<Self> {
        let key = crate::utils::sanitize_api_key(raw);
        if key.is_empty() {
            return Err(InsightsError::validation_field("API key is empty", "api_key"));
        }
        if key.chars().any(char::is_whitespace) {
            return Err(InsightsError::validation_field(
                "API key must not contain whitespace",
                "api_key",
            ));
        }
        Ok(Self(key))
    }

    /// The raw key, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl std::str::FromStr for ApiKey {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Identifier of the tracked flow action (the event-track action of the
/// flow's first block).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(String);

impl FlowId {
    /// Build a flow id from operator input.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InsightsError::validation_field("flow identifier is empty", "flow"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visitor_id_rejects_placeholders() {
        assert!(VisitorId::new("").is_none());
        assert!(VisitorId::new("   ").is_none());
        assert!(VisitorId::new("NaN").is_none());
        assert!(VisitorId::new("None").is_none());
        assert_eq!(
            VisitorId::new(" abc@wa.gw.msging.net ").unwrap().as_str(),
            "abc@wa.gw.msging.net"
        );
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::parse("Key c2VjcmV0").unwrap();
        assert_eq!(key.expose(), "c2VjcmV0");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.to_string(), "***");
    }

    #[test]
    fn test_api_key_rejects_empty() {
        assert!(ApiKey::parse("  ").is_err());
        assert!(ApiKey::parse("\"\"").is_err());
        assert!(ApiKey::parse("two words").is_err());
    }

    #[test]
    fn test_flow_id_serializes_transparently() {
        let flow = FlowId::parse("  inicio ").unwrap();
        assert_eq!(serde_json::to_string(&flow).unwrap(), "\"inicio\"");
        assert!(FlowId::parse("").is_err());
    }
}
