//! Company profile attached to every user.
//!
//! The profile is persisted as a JSON object. Company fields default to
//! [`NO_DATA`] until the user fills them in; the latest-ticket bookkeeping
//! fields default to an empty string.

use serde::Deserialize;

use crate::error::CoreError;

/// Sentinel stored for a company field the user has not filled in yet.
pub const NO_DATA: &str = "no data";

// ---------------------------------------------------------------------------
// ProfileField
// ---------------------------------------------------------------------------

/// The recognised profile keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Organization,
    Address,
    Inn,
    Phone,
    HistoryTicket,
    DataTicket,
    UserName,
}

impl ProfileField {
    /// Every recognised field, in display order.
    pub const ALL: [ProfileField; 7] = [
        Self::Organization,
        Self::Address,
        Self::Inn,
        Self::Phone,
        Self::HistoryTicket,
        Self::DataTicket,
        Self::UserName,
    ];

    /// The four fields a user edits from the company screen.
    pub const COMPANY: [ProfileField; 4] =
        [Self::Organization, Self::Address, Self::Inn, Self::Phone];

    /// JSON key under which the field is stored.
    pub fn key(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Address => "organization_address",
            Self::Inn => "organization_inn",
            Self::Phone => "organization_phone",
            Self::HistoryTicket => "history_ticket",
            Self::DataTicket => "data_ticket",
            Self::UserName => "user_name",
        }
    }

    /// Value a freshly registered user holds for this field.
    pub fn default_value(self) -> &'static str {
        if Self::COMPANY.contains(&self) {
            NO_DATA
        } else {
            ""
        }
    }
}

// ---------------------------------------------------------------------------
// CompanyField
// ---------------------------------------------------------------------------

/// The subset of [`ProfileField`]s a user edits from the company screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompanyField {
    Name,
    Address,
    Inn,
    Phone,
}

impl CompanyField {
    pub const ALL: [CompanyField; 4] = [Self::Name, Self::Address, Self::Inn, Self::Phone];

    pub fn profile_field(self) -> ProfileField {
        match self {
            Self::Name => ProfileField::Organization,
            Self::Address => ProfileField::Address,
            Self::Inn => ProfileField::Inn,
            Self::Phone => ProfileField::Phone,
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

fn no_data() -> String {
    NO_DATA.to_string()
}

/// Organizational metadata for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default = "no_data")]
    pub organization: String,
    #[serde(default = "no_data", alias = "organization_adress")]
    pub organization_address: String,
    #[serde(default = "no_data")]
    pub organization_inn: String,
    #[serde(default = "no_data")]
    pub organization_phone: String,
    #[serde(default)]
    pub history_ticket: String,
    #[serde(default)]
    pub data_ticket: String,
    #[serde(default)]
    pub user_name: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            organization: no_data(),
            organization_address: no_data(),
            organization_inn: no_data(),
            organization_phone: no_data(),
            history_ticket: String::new(),
            data_ticket: String::new(),
            user_name: String::new(),
        }
    }
}

impl Profile {
    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Organization => &self.organization,
            ProfileField::Address => &self.organization_address,
            ProfileField::Inn => &self.organization_inn,
            ProfileField::Phone => &self.organization_phone,
            ProfileField::HistoryTicket => &self.history_ticket,
            ProfileField::DataTicket => &self.data_ticket,
            ProfileField::UserName => &self.user_name,
        }
    }

    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ProfileField::Organization => self.organization = value,
            ProfileField::Address => self.organization_address = value,
            ProfileField::Inn => self.organization_inn = value,
            ProfileField::Phone => self.organization_phone = value,
            ProfileField::HistoryTicket => self.history_ticket = value,
            ProfileField::DataTicket => self.data_ticket = value,
            ProfileField::UserName => self.user_name = value,
        }
    }

    /// Whether the user has replaced the sentinel for `field`.
    pub fn is_filled(&self, field: ProfileField) -> bool {
        let value = self.get(field);
        value != NO_DATA && !value.is_empty()
    }

    /// Decode a stored JSON object. Missing keys fall back to their defaults.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value)
            .map_err(|e| CoreError::InvalidArgument(format!("Malformed profile: {e}")))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "organization": self.organization,
            "organization_address": self.organization_address,
            "organization_inn": self.organization_inn,
            "organization_phone": self.organization_phone,
            "history_ticket": self.history_ticket,
            "data_ticket": self.data_ticket,
            "user_name": self.user_name,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
