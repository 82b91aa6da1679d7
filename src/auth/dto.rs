use serde::{Deserialize, Serialize};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "nutriScore")]
    NutriScore,
    #[serde(rename = "sugar")]
    Sugar,
    #[serde(rename = "salt")]
    Salt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NutriFilter {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "ab")]
    Ab,
    #[serde(rename = "c")]
    C,
    #[serde(rename = "de")]
    De,
}

/// Per-user display preferences for the product list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub sort: SortOrder,
    pub nutri_filter: NutriFilter,
    pub country: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sort: SortOrder::NutriScore,
            nutri_filter: NutriFilter::All,
            country: String::new(),
        }
    }
}

/// Partial update: only the fields present in the body are changed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub sort: Option<SortOrder>,
    pub nutri_filter: Option<NutriFilter>,
    pub country: Option<String>,
}

impl Preferences {
    pub fn merge(&mut self, update: PreferencesUpdate) {
        if let Some(sort) = update.sort {
            self.sort = sort;
        }
        if let Some(filter) = update.nutri_filter {
            self.nutri_filter = filter;
        }
        if let Some(country) = update.country {
            self.country = country;
        }
    }
}
