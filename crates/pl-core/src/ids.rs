use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Serial identifier of a card reader, as advertised over Bluetooth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReaderId(String);

impl ReaderId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for ReaderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReaderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReaderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque identifier tying a payment terminal to the merchant's registered
/// business address. Issued by the payment backend, never parsed locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for LocationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for LocationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LocationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Row identifier of a merchant site in the host application's store list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId(i64);

impl SiteId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl Display for SiteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SiteId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_id_from_str() {
        let id: ReaderId = "CHB204909005931".into();
        assert_eq!(id.as_str(), "CHB204909005931");
        assert_eq!(id.to_string(), "CHB204909005931");
    }

    #[test]
    fn test_location_id_into_inner() {
        let id = LocationId::new("tml_ABC123".to_string());
        assert_eq!(id.into_inner(), "tml_ABC123");
    }
}
