//! Account identity as handed to the planner by the identity provider.
//!
//! The planner performs no authentication of its own: an [`OwnerId`] is an
//! opaque key used to scope saved schedules, and a [`Profile`] is display
//! data only.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_AVATAR;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    /// `None` for blank input; surrounding whitespace is stripped.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display profile of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Whether the client should show shift suggestions for conflicts.
    #[serde(default)]
    pub suggestions_enabled: bool,
}

impl Profile {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            avatar: Some(DEFAULT_AVATAR.to_string()),
            suggestions_enabled: false,
        }
    }

    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(avatar) = &update.avatar {
            self.avatar = Some(avatar.clone()).filter(|a| !a.is_empty());
        }
        if let Some(enabled) = update.suggestions_enabled {
            self.suggestions_enabled = enabled;
        }
    }
}

/// Partial profile edit; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub suggestions_enabled: Option<bool>,
}
