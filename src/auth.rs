use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    error::{AuthError, StoreError},
    password, policy,
    token::TokenService,
    types::{
        LoginRequest, LoginResponse, PublicUser, RegisterRequest, StoredUser, UserId, UserUpdate,
        Username,
    },
};

/// Persistence collaborator for user records.
///
/// Lookups and uniqueness are defined over [`Username::lookup_key`], so two
/// usernames differing only in case refer to the same user. `insert_unique`
/// must be atomic (a unique constraint or equivalent), not check-then-insert.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn find_by_username(&self, username: &Username)
        -> Result<Option<StoredUser>, StoreError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<StoredUser>, StoreError>;

    /// Insert the user, failing with [`StoreError::DuplicateUsername`] if a
    /// user with the same username key already exists.
    async fn insert_unique(&mut self, user: StoredUser) -> Result<StoredUser, StoreError>;

    /// Apply the supplied profile fields, leaving absent fields untouched,
    /// and bump `updated_at` to `at`.
    async fn update(
        &mut self,
        id: &UserId,
        changes: &UserUpdate,
        at: DateTime<Utc>,
    ) -> Result<StoredUser, StoreError>;

    /// Record a successful login at `at`.
    async fn record_login(&mut self, id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Remove the user. Deleting an unknown id fails with
    /// [`StoreError::NotFound`]; it does not silently succeed.
    async fn delete(&mut self, id: &UserId) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct AuthConfig {
    /// The issuer baked into access tokens. Tokens from other issuers are
    /// rejected.
    pub token_issuer: String,
    /// The secret used to sign access tokens. If it changes, all currently
    /// issued tokens stop verifying.
    pub token_secret: SecretString,
    /// How long access tokens remain valid. After this interval, the client
    /// has to log in again.
    pub token_lifetime: Duration,
    pub user_store: Arc<Mutex<dyn UserStore>>,
}

pub(crate) struct AuthInner {
    tokens: TokenService,
    store: Arc<Mutex<dyn UserStore>>,
}

impl AuthInner {
    pub async fn register(
        &self,
        input: RegisterRequest,
        now: DateTime<Utc>,
    ) -> Result<PublicUser, AuthError> {
        policy::validate_username(&input.username)?;
        policy::validate_password(&input.password)?;
        policy::validate_email(&input.email)?;

        let password_hash = password::hash_password(&input.password)?;

        let user = StoredUser {
            id: UserId::new(),
            username: Username(input.username),
            email: input.email,
            password_hash,
            full_name: input.full_name,
            bio: input.bio,
            profile_picture_url: input.profile_picture_url,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let created = self.store.lock().await.insert_unique(user).await?;

        debug!(username = %created.username.0, "registered new user");

        Ok(created.into())
    }

    pub async fn login(
        &self,
        input: LoginRequest,
        now: DateTime<Utc>,
    ) -> Result<LoginResponse, AuthError> {
        let username = Username(input.username);

        // An unknown username and a wrong password collapse into the same
        // error so the response never reveals which one it was.
        let user = self
            .store
            .lock()
            .await
            .find_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(&input.password, &user.password_hash) {
            warn!(username = %username.0, "login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.store.lock().await.record_login(&user.id, now).await?;

        let access_token = self.tokens.issue(&user.id, now)?;

        debug!(username = %username.0, "login succeeded");

        Ok(LoginResponse {
            access_token,
            token_type: "bearer".into(),
        })
    }

    /// Verify a bearer token and resolve its subject to a stored user.
    pub async fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<StoredUser, AuthError> {
        let subject = self.tokens.verify(token, now)?;

        let user = self
            .store
            .lock()
            .await
            .find_by_id(&subject)
            .await?
            .ok_or(AuthError::IdentityGone)?;

        Ok(user)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<PublicUser, AuthError> {
        let user = self
            .store
            .lock()
            .await
            .find_by_id(id)
            .await?
            .ok_or(AuthError::NotFound)?;

        Ok(user.into())
    }

    pub async fn update_profile(
        &self,
        id: &UserId,
        changes: &UserUpdate,
        now: DateTime<Utc>,
    ) -> Result<PublicUser, AuthError> {
        if let Some(email) = &changes.email {
            policy::validate_email(email)?;
        }

        let updated = self.store.lock().await.update(id, changes, now).await?;

        Ok(updated.into())
    }

    pub async fn delete_user(&self, id: &UserId) -> Result<(), AuthError> {
        self.store.lock().await.delete(id).await?;

        debug!(user_id = %id.0, "deleted user");

        Ok(())
    }
}

/// Handle to the auth core. Cheap to clone; policy checks, hashing, and
/// token verification run without taking any lock, so concurrent requests
/// only serialize on the user store itself.
#[derive(Clone)]
pub struct Auth {
    pub(crate) inner: Arc<AuthInner>,
}

impl Auth {
    pub fn new(config: AuthConfig) -> Self {
        let tokens = TokenService::new(
            config.token_issuer,
            config.token_secret,
            config.token_lifetime,
        );

        Self {
            inner: Arc::new(AuthInner {
                tokens,
                store: config.user_store,
            }),
        }
    }
}
