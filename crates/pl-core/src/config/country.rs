use serde::{Deserialize, Serialize};

use crate::reader::ReaderType;

/// Which reader hardware is supported in a given country.
///
/// In-person payments are only available in a closed set of countries, each
/// with its own allow-list of certified terminals. Discovery is always
/// scoped to this list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryConfig {
    pub country_code: String,
    pub supported_readers: Vec<ReaderType>,
}

impl CountryConfig {
    /// Look up the configuration for an ISO 3166-1 alpha-2 country code.
    /// Returns `None` for countries where in-person payments are not
    /// supported.
    pub fn for_country(country_code: &str) -> Option<Self> {
        let supported_readers = match country_code.to_ascii_lowercase().as_str() {
            "us" => vec![
                ReaderType::Chipper2X,
                ReaderType::StripeM2,
                ReaderType::WisePad3,
            ],
            "ca" => vec![ReaderType::WisePad3],
            _ => return None,
        };
        Some(Self {
            country_code: country_code.to_ascii_lowercase(),
            supported_readers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_supports_all_reader_models() {
        let config = CountryConfig::for_country("US").expect("US is supported");
        assert_eq!(
            config.supported_readers,
            vec![
                ReaderType::Chipper2X,
                ReaderType::StripeM2,
                ReaderType::WisePad3,
            ]
        );
    }

    #[test]
    fn canada_supports_wisepad_only() {
        let config = CountryConfig::for_country("ca").expect("CA is supported");
        assert_eq!(config.supported_readers, vec![ReaderType::WisePad3]);
    }

    #[test]
    fn unsupported_country_has_no_config() {
        assert!(CountryConfig::for_country("de").is_none());
    }
}
