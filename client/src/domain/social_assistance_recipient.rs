//! Recipient applications: records, write payloads, and the approval
//! decision payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::head_of_family::HeadOfFamily;
use crate::domain::social_assistance::SocialAssistance;
use crate::domain::upload::FileUpload;

/// Application lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    Pending,
    Approved,
    Rejected,
}

/// Disbursement bank accepted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bank {
    Bca,
    Bni,
    Bri,
    Mandiri,
}

/// A social-assistance application by one head of family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialAssistanceRecipient {
    pub id: String,
    pub status: RecipientStatus,
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<Bank>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,

    // Audit trail filled by approval decisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Back-references, embedded per query expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_assistance: Option<SocialAssistance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_of_family: Option<HeadOfFamily>,
}

/// Write payload for a new application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientPayload {
    pub social_assistance_id: String,
    pub head_of_family_id: String,
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<Bank>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<u64>,
}

/// Approval decision: requires a transfer proof image.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalPayload {
    pub proof: FileUpload,
}

/// Rejection failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionValidationError {
    /// A rejection must carry a reason.
    EmptyReason,
}

impl fmt::Display for RejectionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyReason => write!(f, "rejection reason must not be empty"),
        }
    }
}

impl std::error::Error for RejectionValidationError {}

/// Rejection decision with its mandatory reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionPayload {
    rejection_reason: String,
}

impl RejectionPayload {
    /// Validate the reason text.
    ///
    /// # Errors
    ///
    /// Returns [`RejectionValidationError::EmptyReason`] when blank.
    pub fn try_new(rejection_reason: &str) -> Result<Self, RejectionValidationError> {
        let trimmed = rejection_reason.trim();
        if trimmed.is_empty() {
            return Err(RejectionValidationError::EmptyReason);
        }
        Ok(Self {
            rejection_reason: trimmed.to_owned(),
        })
    }

    /// The validated reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        self.rejection_reason.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_requires_a_reason() {
        let error = RejectionPayload::try_new("   ").expect_err("blank reason must fail");
        assert_eq!(error, RejectionValidationError::EmptyReason);

        let payload = RejectionPayload::try_new("  incomplete documents ")
            .expect("valid reason should pass");
        assert_eq!(payload.reason(), "incomplete documents");
    }

    #[test]
    fn recipient_deserialises_with_expanded_relations() {
        let payload = serde_json::json!({
            "id": "r-1",
            "status": "pending",
            "amount": 250_000,
            "bank": "bca",
            "account_number": 1_234_567,
            "created_at": "2024-05-01T08:00:00Z",
            "social_assistance": {
                "id": "sa-1",
                "name": "Staple Food Aid",
                "provider": "Village Office",
                "amount": 250_000,
                "category": "staple",
            },
        });

        let recipient: SocialAssistanceRecipient =
            serde_json::from_value(payload).expect("record should decode");
        assert_eq!(recipient.status, RecipientStatus::Pending);
        assert_eq!(recipient.bank, Some(Bank::Bca));
        let program = recipient.social_assistance.expect("expanded relation");
        assert_eq!(program.name, "Staple Food Aid");
        assert!(recipient.head_of_family.is_none(), "unexpanded relation stays absent");
    }
}
