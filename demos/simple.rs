use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use identity_for_warp::{
    build_api_route_filter, handle_auth_errors, with_auth, Auth, AuthConfig, StoreError,
    StoredUser, UserId, UserStore, UserUpdate, Username,
};
use secrecy::SecretString;
use serde_json::json;
use tokio::sync::Mutex;
use warp::{path, Filter};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let user_store = Arc::new(Mutex::new(SimpleInMemoryDb::new()));

    let config = AuthConfig {
        token_issuer: "insert app or organisation name here".into(),
        token_secret: SecretString::from("this is a really bad secret".to_string()),
        token_lifetime: Duration::from_secs(60 * 30),
        user_store,
    };

    let auth = Auth::new(config);

    let auth_routes = build_api_route_filter(&auth);

    let unsecured_homepage =
        warp::path::end().then(|| async move { warp::reply::html("hello, world!") });

    let secure_page = path!("whoami")
        .and(with_auth(&auth))
        .then(|user: StoredUser| async move { warp::reply::json(&json!({ "user id": user.id })) });

    let all_routes = unsecured_homepage
        .or(secure_page)
        .or(auth_routes)
        .recover(handle_auth_errors);

    warp::serve(all_routes)
        .run("127.0.0.1:4000".parse::<SocketAddr>().unwrap())
        .await;
}

struct SimpleInMemoryDb {
    // keyed by the case-insensitive username lookup key
    users: HashMap<String, StoredUser>,
}

impl SimpleInMemoryDb {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
        }
    }
}

#[async_trait]
impl UserStore for SimpleInMemoryDb {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.users.get(&username.lookup_key()).cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<StoredUser>, StoreError> {
        Ok(self.users.values().find(|user| user.id == *id).cloned())
    }

    async fn insert_unique(&mut self, user: StoredUser) -> Result<StoredUser, StoreError> {
        let key = user.username.lookup_key();

        if self.users.contains_key(&key) {
            return Err(StoreError::DuplicateUsername);
        }

        self.users.insert(key, user.clone());
        Ok(user)
    }

    async fn update(
        &mut self,
        id: &UserId,
        changes: &UserUpdate,
        at: DateTime<Utc>,
    ) -> Result<StoredUser, StoreError> {
        let user = self
            .users
            .values_mut()
            .find(|user| user.id == *id)
            .ok_or(StoreError::NotFound)?;

        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(full_name) = &changes.full_name {
            user.full_name = Some(full_name.clone());
        }
        if let Some(bio) = &changes.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(url) = &changes.profile_picture_url {
            user.profile_picture_url = Some(url.clone());
        }
        user.updated_at = at;

        Ok(user.clone())
    }

    async fn record_login(&mut self, id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let user = self
            .users
            .values_mut()
            .find(|user| user.id == *id)
            .ok_or(StoreError::NotFound)?;

        user.last_login_at = Some(at);

        Ok(())
    }

    async fn delete(&mut self, id: &UserId) -> Result<(), StoreError> {
        let key = self
            .users
            .iter()
            .find(|(_, user)| user.id == *id)
            .map(|(key, _)| key.clone())
            .ok_or(StoreError::NotFound)?;

        self.users.remove(&key);

        Ok(())
    }
}
