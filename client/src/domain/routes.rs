//! Route vocabulary and per-route access metadata.
//!
//! The client never owns rendering; it only needs stable route names so the
//! interceptors and the guard can compare and target views without looping.

/// Stable route names shared by the guard, the interceptors, and embedders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteName {
    Dashboard,
    Login,
    Forbidden,
    HeadOfFamilyList,
    HeadOfFamilyDetail,
    SocialAssistanceList,
    SocialAssistanceDetail,
    SocialAssistanceRecipientList,
    SocialAssistanceRecipientDetail,
    DevelopmentList,
    DevelopmentDetail,
}

/// Access requirements attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    /// Only reachable with an authenticated session.
    pub requires_auth: bool,
    /// Only reachable without one (the login view).
    pub requires_unauth: bool,
    /// Permission required to enter, when any.
    pub permission: Option<&'static str>,
}

impl RouteMeta {
    const fn protected(permission: &'static str) -> Self {
        Self {
            requires_auth: true,
            requires_unauth: false,
            permission: Some(permission),
        }
    }

    const fn open() -> Self {
        Self {
            requires_auth: false,
            requires_unauth: false,
            permission: None,
        }
    }
}

impl RouteName {
    /// Access metadata for this route.
    #[must_use]
    pub const fn meta(self) -> RouteMeta {
        match self {
            Self::Dashboard => RouteMeta::protected("dashboard-menu"),
            Self::Login => RouteMeta {
                requires_auth: false,
                requires_unauth: true,
                permission: None,
            },
            Self::Forbidden => RouteMeta::open(),
            Self::HeadOfFamilyList | Self::HeadOfFamilyDetail => {
                RouteMeta::protected("head-of-family-list")
            }
            Self::SocialAssistanceList | Self::SocialAssistanceDetail => {
                RouteMeta::protected("social-assistance-list")
            }
            Self::SocialAssistanceRecipientList | Self::SocialAssistanceRecipientDetail => {
                RouteMeta::protected("social-assistance-recipient-list")
            }
            Self::DevelopmentList | Self::DevelopmentDetail => {
                RouteMeta::protected("development-list")
            }
        }
    }
}
