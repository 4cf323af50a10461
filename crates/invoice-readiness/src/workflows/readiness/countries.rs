use super::analysis::AnalysisError;
use serde::Serialize;

pub const GLOBAL_COUNTRY_CODE: &str = "GLOBAL";

/// Jurisdiction-specific e-invoicing constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryProfile {
    pub code: &'static str,
    pub label: &'static str,
    pub allowed_currencies: Vec<&'static str>,
    pub required_trn_length: Option<usize>,
}

impl CountryProfile {
    pub fn allows_currency(&self, currency: &str) -> bool {
        self.allowed_currencies.contains(&currency)
    }

    pub fn currency_list(&self) -> String {
        self.allowed_currencies.join(", ")
    }
}

/// Immutable set of supported jurisdictions, passed into the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRegistry {
    profiles: Vec<CountryProfile>,
}

impl CountryRegistry {
    pub fn new(profiles: Vec<CountryProfile>) -> Self {
        Self { profiles }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            CountryProfile {
                code: "UAE",
                label: "United Arab Emirates",
                allowed_currencies: vec!["AED"],
                required_trn_length: Some(15),
            },
            CountryProfile {
                code: "KSA",
                label: "Kingdom of Saudi Arabia",
                allowed_currencies: vec!["SAR"],
                required_trn_length: Some(15),
            },
            CountryProfile {
                code: "MY",
                label: "Malaysia",
                allowed_currencies: vec!["MYR"],
                required_trn_length: Some(12),
            },
            CountryProfile {
                code: GLOBAL_COUNTRY_CODE,
                label: "Global (All Currencies)",
                allowed_currencies: vec!["AED", "SAR", "MYR", "USD"],
                required_trn_length: None,
            },
        ])
    }

    pub fn lookup(&self, code: &str) -> Result<&CountryProfile, AnalysisError> {
        let code = code.trim();
        self.profiles
            .iter()
            .find(|profile| profile.code == code)
            .ok_or_else(|| AnalysisError::UnknownCountry(code.to_string()))
    }

    pub fn profiles(&self) -> &[CountryProfile] {
        &self.profiles
    }
}

impl Default for CountryRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
