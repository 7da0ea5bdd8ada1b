use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// RBAC marker carried by every account and copied into the session snapshot.
/// The first account ever created is assigned `Admin` by the store; everyone
/// else defaults to `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UserAccount
///
/// Canonical identity record from the `accounts` table. `password_hash` is
/// the Argon2 digest produced by the password module, never the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    /// Unique handle, alphanumeric + underscore.
    pub username: String,
    /// Unique, stored lowercase.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Opaque path returned by the storage layer, e.g. `/uploads/...`.
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing
///
/// A property listing. `owner` is a weak reference to an account: relation
/// only, never cascade-deleted, absence tolerated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub home: String,
    pub country: String,
    pub city: String,
    pub price: f64,
    pub owner: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity
///
/// The session snapshot attached to authenticated requests. Populated once
/// at login from the stored account; downstream logic only ever sees this
/// normalized view or an explicit "no identity".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

// --- Repository Payloads ---

/// Fields for account creation. The role is intentionally absent: it is
/// computed by the store at insert time (first account becomes admin).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
}

/// Explicit outcome for the profile image on an account update, replacing
/// the source's `removeImage == "true"` sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Replace(String),
    Remove,
}

#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub name: String,
    pub username: String,
    pub email: String,
    /// `None` keeps the stored hash.
    pub password_hash: Option<String>,
    pub profile_image: ImageChange,
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub home: String,
    pub country: String,
    pub city: String,
    pub price: f64,
    pub owner: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ListingUpdate {
    pub home: String,
    pub country: String,
    pub city: String,
    pub price: f64,
}
