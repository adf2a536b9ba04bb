//! Head-of-family records and write payloads.

use serde::{Deserialize, Serialize};

use crate::domain::upload::FileUpload;
use crate::domain::user::User;

/// A registered head of family.
///
/// Relational fields are foreign-key-style back-references; the referenced
/// record is embedded only when the query expands it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadOfFamily {
    pub id: String,
    pub identity_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_members_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
}

/// Write payload for creating or updating a head of family.
///
/// Serialised as multipart form fields; the picture travels as a file part
/// when present.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadOfFamilyPayload {
    pub identity_number: String,
    pub date_of_birth: Option<String>,
    pub occupation: Option<String>,
    pub profile_picture: Option<FileUpload>,
}

impl HeadOfFamilyPayload {
    /// Plain text form fields, excluding the file part.
    #[must_use]
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("identity_number", self.identity_number.clone())];
        if let Some(date_of_birth) = &self.date_of_birth {
            fields.push(("date_of_birth", date_of_birth.clone()));
        }
        if let Some(occupation) = &self.occupation {
            fields.push(("occupation", occupation.clone()));
        }
        fields
    }
}
