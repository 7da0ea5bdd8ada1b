//! Server-side session store.
//!
//! Sessions are keyed by an opaque token carried in a cookie. Only a digest
//! of the token (mixed with the configured session secret) is stored, so a
//! leaked sessions table cannot be replayed. Lookups are sliding: a hit
//! extends the inactivity window, and expiry is enforced here, never by
//! handler code.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Identity, Role},
};

/// Inactivity window before a session is considered dead.
pub const SESSION_TTL_HOURS: i64 = 24;

/// SessionStore
///
/// External key-value collaborator mapping token → identity snapshot. The
/// application never holds session state in a process-global.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session for a freshly authenticated identity and return the
    /// raw token destined for the cookie.
    async fn create(&self, identity: Identity) -> Result<String, AppError>;

    /// Resolve a token to its identity snapshot, extending the inactivity
    /// window on success. Expired or unknown tokens resolve to `None`.
    async fn get(&self, token: &str) -> Option<Identity>;

    /// Destroy the session outright. Destroying an unknown token is a no-op.
    async fn destroy(&self, token: &str);
}

pub type SessionState = Arc<dyn SessionStore>;

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

fn hash_token(secret: &str, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

// --- Postgres-backed store ---

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: Uuid,
    username: String,
    email: String,
    role: Role,
}

/// PgSessionStore
///
/// Sessions table in the application database. The snapshot is denormalized
/// into the row so a lookup costs a single round-trip.
pub struct PgSessionStore {
    pool: PgPool,
    secret: String,
}

impl PgSessionStore {
    pub fn new(pool: PgPool, secret: impl Into<String>) -> Self {
        Self {
            pool,
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, identity: Identity) -> Result<String, AppError> {
        let token = generate_token();
        let token_hash = hash_token(&self.secret, &token);

        sqlx::query(
            "INSERT INTO sessions (id, token_hash, user_id, username, email, role, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, now() + interval '24 hours')",
        )
        .bind(Uuid::new_v4())
        .bind(&token_hash)
        .bind(identity.id)
        .bind(&identity.username)
        .bind(&identity.email)
        .bind(identity.role)
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    async fn get(&self, token: &str) -> Option<Identity> {
        let token_hash = hash_token(&self.secret, token);

        // Touch and read in one statement; an expired row never matches.
        let row = sqlx::query_as::<_, SessionRow>(
            "UPDATE sessions SET expires_at = now() + interval '24 hours' \
             WHERE token_hash = $1 AND expires_at > now() \
             RETURNING user_id, username, email, role",
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("session lookup error: {:?}", e);
            None
        })?;

        Some(Identity {
            id: row.user_id,
            username: row.username,
            email: row.email,
            role: row.role,
        })
    }

    async fn destroy(&self, token: &str) {
        let token_hash = hash_token(&self.secret, token);
        if let Err(e) = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&self.pool)
            .await
        {
            tracing::error!("session destroy error: {:?}", e);
        }
    }
}

// --- In-memory store (tests and local scaffolding) ---

/// MemorySessionStore
///
/// Mutex-guarded map with the same contract as the Postgres store,
/// including sliding expiry. Used by the test suites.
pub struct MemorySessionStore {
    ttl: Duration,
    inner: Mutex<HashMap<String, (Identity, DateTime<Utc>)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(SESSION_TTL_HOURS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.inner.lock().len()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, identity: Identity) -> Result<String, AppError> {
        let token = generate_token();
        self.inner
            .lock()
            .insert(token.clone(), (identity, Utc::now() + self.ttl));
        Ok(token)
    }

    async fn get(&self, token: &str) -> Option<Identity> {
        let mut inner = self.inner.lock();
        let expired = match inner.get(token) {
            Some((_, expires_at)) => *expires_at <= Utc::now(),
            None => return None,
        };
        if expired {
            inner.remove(token);
            return None;
        }
        let entry = inner.get_mut(token)?;
        entry.1 = Utc::now() + self.ttl;
        Some(entry.0.clone())
    }

    async fn destroy(&self, token: &str) {
        self.inner.lock().remove(token);
    }
}
