//! User record embedded in relational expansions.

use serde::{Deserialize, Serialize};

use crate::domain::head_of_family::HeadOfFamily;

/// Account record attached to a head of family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Back-reference; embedded only when the query expands it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_of_family: Option<Box<HeadOfFamily>>,
}
