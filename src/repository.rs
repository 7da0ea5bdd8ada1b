use crate::{
    error::AppError,
    models::{
        AccountUpdate, ImageChange, Listing, ListingUpdate, NewAccount, NewListing, UserAccount,
    },
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Abstract contract for all persistence operations, shared as a trait
/// object so handlers never know the concrete backend. Uniqueness of
/// username/email is enforced here (unique indexes), not by the validators;
/// the validators are a pre-filter.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---

    /// Insert a new account. The role is computed at insert time: the first
    /// account in an empty store becomes the admin. A username/email
    /// collision surfaces as `AppError::Duplicate`.
    async fn create_account(&self, account: NewAccount) -> Result<UserAccount, AppError>;

    async fn find_account(&self, id: Uuid) -> Result<Option<UserAccount>, AppError>;

    /// Lookup by login identifier: exact username match, or
    /// case-insensitive email match.
    async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserAccount>, AppError>;

    /// All accounts, oldest first, for the admin grid.
    async fn list_accounts(&self) -> Result<Vec<UserAccount>, AppError>;

    /// Update an account. `AppError::NotFound` when the id matches nothing,
    /// `AppError::Duplicate` when the new username/email collides.
    async fn update_account(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<UserAccount, AppError>;

    /// Delete an account. Listings owned by it are left in place with an
    /// orphaned owner reference.
    async fn delete_account(&self, id: Uuid) -> Result<(), AppError>;

    // --- Listings ---

    async fn create_listing(&self, listing: NewListing) -> Result<Listing, AppError>;

    async fn find_listing(&self, id: Uuid) -> Result<Option<Listing>, AppError>;

    /// All listings, most recent first.
    async fn list_listings(&self) -> Result<Vec<Listing>, AppError>;

    /// Listings owned by one account, most recent first.
    async fn listings_by_owner(&self, owner: Uuid) -> Result<Vec<Listing>, AppError>;

    async fn update_listing(
        &self,
        id: Uuid,
        update: ListingUpdate,
    ) -> Result<Listing, AppError>;

    async fn delete_listing(&self, id: Uuid) -> Result<(), AppError>;
}

pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// Concrete implementation backed by the PostgreSQL pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, name, username, email, password_hash, role, profile_image, created_at";

const LISTING_COLUMNS: &str = "id, home, country, city, price, owner, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    /// create_account
    ///
    /// The role is decided inside the INSERT so the emptiness check and the
    /// write happen in a single statement. Concurrent duplicates are
    /// resolved by the unique indexes: one insert wins, the other maps to
    /// `Duplicate` via the error conversion.
    async fn create_account(&self, account: NewAccount) -> Result<UserAccount, AppError> {
        let sql = format!(
            "INSERT INTO accounts (id, name, username, email, password_hash, role, profile_image) \
             VALUES ($1, $2, $3, $4, $5, \
                     CASE WHEN (SELECT count(*) FROM accounts) = 0 \
                          THEN 'admin'::account_role ELSE 'user'::account_role END, \
                     $6) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, UserAccount>(&sql)
            .bind(Uuid::new_v4())
            .bind(&account.name)
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.profile_image)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<UserAccount>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        Ok(sqlx::query_as::<_, UserAccount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserAccount>, AppError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE username = $1 OR email = lower($1)"
        );
        Ok(sqlx::query_as::<_, UserAccount>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_accounts(&self) -> Result<Vec<UserAccount>, AppError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at ASC");
        Ok(sqlx::query_as::<_, UserAccount>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    /// update_account
    ///
    /// COALESCE keeps the stored password hash when no new one is supplied;
    /// the profile image applies only when the caller asked for a change.
    async fn update_account(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<UserAccount, AppError> {
        let (apply_image, image_value): (bool, Option<String>) = match update.profile_image {
            ImageChange::Keep => (false, None),
            ImageChange::Replace(path) => (true, Some(path)),
            ImageChange::Remove => (true, None),
        };

        let sql = format!(
            "UPDATE accounts \
             SET name = $2, username = $3, email = $4, \
                 password_hash = COALESCE($5, password_hash), \
                 profile_image = CASE WHEN $6 THEN $7 ELSE profile_image END \
             WHERE id = $1 \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, UserAccount>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(&update.username)
            .bind(&update.email)
            .bind(&update.password_hash)
            .bind(apply_image)
            .bind(&image_value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn delete_account(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn create_listing(&self, listing: NewListing) -> Result<Listing, AppError> {
        let sql = format!(
            "INSERT INTO listings (id, home, country, city, price, owner) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {LISTING_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Listing>(&sql)
            .bind(Uuid::new_v4())
            .bind(&listing.home)
            .bind(&listing.country)
            .bind(&listing.city)
            .bind(listing.price)
            .bind(listing.owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<Listing>, AppError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1");
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, AppError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn listings_by_owner(&self, owner: Uuid) -> Result<Vec<Listing>, AppError> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE owner = $1 ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Listing>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_listing(
        &self,
        id: Uuid,
        update: ListingUpdate,
    ) -> Result<Listing, AppError> {
        let sql = format!(
            "UPDATE listings \
             SET home = $2, country = $3, city = $4, price = $5, updated_at = now() \
             WHERE id = $1 \
             RETURNING {LISTING_COLUMNS}"
        );
        sqlx::query_as::<_, Listing>(&sql)
            .bind(id)
            .bind(&update.home)
            .bind(&update.country)
            .bind(&update.city)
            .bind(update.price)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn delete_listing(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
