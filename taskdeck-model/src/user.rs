//! User identity types reported by the identity provider.

use serde::{Deserialize, Serialize};

/// Opaque identifier issued by the identity provider.
///
/// Used as the subscription filter predicate: a task's `owner_id` always
/// equals the identifier of the user whose subscription produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new user identifier from a string representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string representation of this user ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated user handle, as yielded by the provider's
/// current-user observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Unique identity-provider id.
    pub id: UserId,
    /// Human-readable display name.
    pub display_name: String,
    /// Optional avatar URL.
    pub photo_url: Option<String>,
}

impl AuthUser {
    /// Initials for a fallback avatar when no photo is available.
    ///
    /// First letter of each whitespace-separated name part, uppercased.
    /// Falls back to `"U"` for an empty display name.
    #[must_use]
    pub fn initials(&self) -> String {
        let initials: String = self
            .display_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }
}
