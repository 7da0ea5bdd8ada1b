//! Shared test fixtures: an in-memory repository with the same contract as
//! the Postgres one (uniqueness, first-account-becomes-admin) and a state
//! builder wiring it to the in-memory session store and the mock storage.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use homestay::{
    AppConfig, AppState, MemorySessionStore, MockStorageService, Repository, RepositoryState,
    SessionState, StorageState,
    error::AppError,
    models::{
        AccountUpdate, ImageChange, Listing, ListingUpdate, NewAccount, NewListing, Role,
        UserAccount,
    },
};

#[derive(Default)]
struct Inner {
    accounts: Vec<UserAccount>,
    listings: Vec<Listing>,
}

/// In-memory repository. All checks for one operation happen under a
/// single lock, so concurrent duplicate registrations resolve the same way
/// the database's unique indexes would: exactly one wins.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> usize {
        self.inner.lock().accounts.len()
    }
}

fn collides(existing: &UserAccount, username: &str, email: &str) -> bool {
    existing.username == username || existing.email == email
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_account(&self, account: NewAccount) -> Result<UserAccount, AppError> {
        let mut inner = self.inner.lock();
        if inner
            .accounts
            .iter()
            .any(|a| collides(a, &account.username, &account.email))
        {
            return Err(AppError::Duplicate);
        }
        let role = if inner.accounts.is_empty() {
            Role::Admin
        } else {
            Role::User
        };
        let created = UserAccount {
            id: Uuid::new_v4(),
            name: account.name,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            role,
            profile_image: account.profile_image,
            created_at: Utc::now(),
        };
        inner.accounts.push(created.clone());
        Ok(created)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<UserAccount>, AppError> {
        Ok(self
            .inner
            .lock()
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<UserAccount>, AppError> {
        let lowered = identifier.to_lowercase();
        Ok(self
            .inner
            .lock()
            .accounts
            .iter()
            .find(|a| a.username == identifier || a.email == lowered)
            .cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<UserAccount>, AppError> {
        Ok(self.inner.lock().accounts.clone())
    }

    async fn update_account(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<UserAccount, AppError> {
        let mut inner = self.inner.lock();
        if inner
            .accounts
            .iter()
            .any(|a| a.id != id && collides(a, &update.username, &update.email))
        {
            return Err(AppError::Duplicate);
        }
        let account = inner
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppError::NotFound)?;
        account.name = update.name;
        account.username = update.username;
        account.email = update.email;
        if let Some(hash) = update.password_hash {
            account.password_hash = hash;
        }
        match update.profile_image {
            ImageChange::Keep => {}
            ImageChange::Replace(path) => account.profile_image = Some(path),
            ImageChange::Remove => account.profile_image = None,
        }
        Ok(account.clone())
    }

    async fn delete_account(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.lock();
        let before = inner.accounts.len();
        inner.accounts.retain(|a| a.id != id);
        if inner.accounts.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn create_listing(&self, listing: NewListing) -> Result<Listing, AppError> {
        let now = Utc::now();
        let created = Listing {
            id: Uuid::new_v4(),
            home: listing.home,
            country: listing.country,
            city: listing.city,
            price: listing.price,
            owner: listing.owner,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().listings.push(created.clone());
        Ok(created)
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<Listing>, AppError> {
        Ok(self
            .inner
            .lock()
            .listings
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, AppError> {
        let mut listings = self.inner.lock().listings.clone();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn listings_by_owner(&self, owner: Uuid) -> Result<Vec<Listing>, AppError> {
        let mut listings: Vec<Listing> = self
            .inner
            .lock()
            .listings
            .iter()
            .filter(|l| l.owner == Some(owner))
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn update_listing(&self, id: Uuid, update: ListingUpdate) -> Result<Listing, AppError> {
        let mut inner = self.inner.lock();
        let listing = inner
            .listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(AppError::NotFound)?;
        listing.home = update.home;
        listing.country = update.country;
        listing.city = update.city;
        listing.price = update.price;
        listing.updated_at = Utc::now();
        Ok(listing.clone())
    }

    async fn delete_listing(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.lock();
        let before = inner.listings.len();
        inner.listings.retain(|l| l.id != id);
        if inner.listings.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

/// Full application state over the in-memory fixtures, keeping handles to
/// the repository and session store for direct inspection.
pub struct TestHarness {
    pub state: AppState,
    pub repo: Arc<MemoryRepository>,
    pub sessions: Arc<MemorySessionStore>,
}

pub fn test_state() -> TestHarness {
    let repo = Arc::new(MemoryRepository::new());
    let sessions = Arc::new(MemorySessionStore::new());
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        sessions: sessions.clone() as SessionState,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        config: AppConfig::default(),
    };
    TestHarness {
        state,
        repo,
        sessions,
    }
}
