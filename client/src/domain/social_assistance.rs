//! Social-assistance program records and write payloads.

use serde::{Deserialize, Serialize};

use crate::domain::upload::FileUpload;

/// Program categories accepted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocialAssistanceCategory {
    #[serde(rename = "staple")]
    Staple,
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "subsidized fuel")]
    SubsidizedFuel,
    #[serde(rename = "health")]
    Health,
}

impl SocialAssistanceCategory {
    /// Wire value for form submission.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staple => "staple",
            Self::Cash => "cash",
            Self::SubsidizedFuel => "subsidized fuel",
            Self::Health => "health",
        }
    }
}

/// A social-assistance program definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialAssistance {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<SocialAssistanceCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    /// Recipient count, present when the query asks for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_assistance_recipients_count: Option<u64>,
}

/// Write payload for creating or updating a program.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialAssistancePayload {
    pub name: String,
    pub category: SocialAssistanceCategory,
    pub amount: u64,
    pub provider: String,
    pub description: String,
    pub is_available: bool,
    /// Required on create; optional on update (keeps the stored image).
    pub thumbnail: Option<FileUpload>,
}

impl SocialAssistancePayload {
    /// Plain text form fields, excluding the file part.
    #[must_use]
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let is_available = if self.is_available { "1" } else { "0" };
        vec![
            ("name", self.name.clone()),
            ("category", self.category.as_str().to_owned()),
            ("amount", self.amount.to_string()),
            ("provider", self.provider.clone()),
            ("description", self.description.clone()),
            ("is_available", is_available.to_owned()),
        ]
    }
}
