//! Village development projects: records, write payloads, and the amount
//! parsing used when an update re-sends a stored display value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::derived::{end_date, parse_date, DATE_FORMAT};
use crate::domain::head_of_family::HeadOfFamily;
use crate::domain::upload::FileUpload;
use crate::domain::user::User;

/// A village development project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Development {
    pub id: String,
    pub name: String,
    pub description: String,
    pub person_in_charge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development_applicants_count: Option<u64>,
}

/// An application to work on a development project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentApplicant {
    pub id: String,
    pub status: ApplicantStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_of_family: Option<HeadOfFamily>,
}

/// Applicant lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicantStatus {
    Pending,
    Approved,
    Rejected,
}

/// Write-payload failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevelopmentPayloadError {
    /// The start date is missing or unparsable.
    InvalidStartDate,
    /// Projects run for at least one day.
    DaysNeededOutOfRange,
}

impl fmt::Display for DevelopmentPayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStartDate => write!(f, "start date must be a valid date"),
            Self::DaysNeededOutOfRange => write!(f, "days needed must be at least 1"),
        }
    }
}

impl std::error::Error for DevelopmentPayloadError {}

/// Write payload for creating or updating a project.
///
/// The server stores only the date range: `end_date` is derived here from
/// `start_date + (days_needed - 1)` and the day count itself is never
/// transmitted.
#[derive(Debug, Clone, PartialEq)]
pub struct DevelopmentPayload {
    pub name: String,
    pub person_in_charge: String,
    pub description: String,
    pub start_date: String,
    pub days_needed: i64,
    /// Budget in whole currency units. Required on create; updates re-send
    /// the stored value instead of a form input.
    pub amount: Option<u64>,
    pub status: String,
    /// Required on create; optional on update (keeps the stored image).
    pub thumbnail: Option<FileUpload>,
}

impl DevelopmentPayload {
    /// Derive the inclusive end date from the schedule inputs.
    ///
    /// # Errors
    ///
    /// Returns [`DevelopmentPayloadError`] when the schedule is invalid.
    pub fn derived_end_date(&self) -> Result<String, DevelopmentPayloadError> {
        let start =
            parse_date(&self.start_date).ok_or(DevelopmentPayloadError::InvalidStartDate)?;
        let end = end_date(start, self.days_needed)
            .ok_or(DevelopmentPayloadError::DaysNeededOutOfRange)?;
        Ok(end.format(DATE_FORMAT).to_string())
    }

    /// Plain text form fields, excluding amount and the file part.
    ///
    /// # Errors
    ///
    /// Returns [`DevelopmentPayloadError`] when the end date cannot be
    /// derived.
    pub fn text_fields(&self) -> Result<Vec<(&'static str, String)>, DevelopmentPayloadError> {
        Ok(vec![
            ("name", self.name.clone()),
            ("person_in_charge", self.person_in_charge.clone()),
            ("description", self.description.clone()),
            ("start_date", self.start_date.clone()),
            ("end_date", self.derived_end_date()?),
            ("status", self.status.clone()),
        ])
    }
}

/// Parse a stored display amount into a whole currency unit.
///
/// Tolerates thousand separators and a decimal tail in either locale
/// convention ("835.116,89" or "835,116.89" both parse to 835116). `None`
/// when no digits are present.
#[must_use]
pub fn parse_display_amount(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    // The last separator, if followed only by 1-2 digits, is a decimal
    // point; everything else is grouping.
    let separators: Vec<usize> = trimmed
        .char_indices()
        .filter(|(_, c)| *c == '.' || *c == ',')
        .map(|(i, _)| i)
        .collect();
    let decimal_cut = separators.last().copied().filter(|&index| {
        trimmed.get(index + 1..).is_some_and(|tail| {
            !tail.is_empty() && tail.len() <= 2 && tail.chars().all(|c| c.is_ascii_digit())
        })
    });

    let integer_part: String = trimmed
        .char_indices()
        .take_while(|(i, _)| decimal_cut.is_none_or(|cut| *i < cut))
        .map(|(_, c)| c)
        .filter(char::is_ascii_digit)
        .collect();

    integer_part.parse().ok()
}
