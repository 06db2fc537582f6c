//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use fashion_advisor_core::{BodyProfile, Email, UserId};

/// A registered user (domain type).
///
/// The password hash never leaves the repository layer except for verification.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address (unique).
    pub email: Email,
    /// Styling profile captured at registration.
    pub profile: BodyProfile,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

