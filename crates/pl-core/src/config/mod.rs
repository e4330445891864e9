//! Per-country payments configuration.
mod country;

pub use country::CountryConfig;
