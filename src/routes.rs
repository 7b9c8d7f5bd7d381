use std::{convert::Infallible, sync::Arc};

use chrono::Utc;
use serde_json::json;
use warp::{
    hyper::StatusCode,
    path, Filter, Rejection, Reply,
};

use crate::{
    auth::{Auth, AuthInner},
    error::{AuthError, TokenError},
    types::{LoginRequest, RegisterRequest, StoredUser, UserId, UserUpdate},
};

/// Build the user-management API: registration, login, and the
/// bearer-token-protected read/update/delete routes.
pub fn build_api_route_filter(
    auth: &Auth,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let register = path!("users" / "register")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth_state(auth.inner.clone()))
        .and_then(user_register);

    let login = path!("users" / "login")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_auth_state(auth.inner.clone()))
        .and_then(user_login);

    let get_user = path!("users" / String)
        .and(warp::get())
        .and(with_auth(auth))
        .and(with_auth_state(auth.inner.clone()))
        .and_then(user_get);

    let update_user = path!("users" / String)
        .and(warp::put())
        .and(warp::body::json())
        .and(with_auth(auth))
        .and(with_auth_state(auth.inner.clone()))
        .and_then(user_update);

    let delete_user = path!("users" / String)
        .and(warp::delete())
        .and(with_auth(auth))
        .and(with_auth_state(auth.inner.clone()))
        .and_then(user_delete);

    register
        .or(login)
        .or(get_user)
        .or(update_user)
        .or(delete_user)
}

/// Filter that authenticates the caller's bearer token and resolves it to
/// the stored user, for protecting application routes.
pub fn with_auth(auth: &Auth) -> impl Filter<Extract = (StoredUser,), Error = Rejection> + Clone {
    warp::header("authorization")
        .and(with_auth_state(auth.inner.clone()))
        .and_then(user_auth_check)
}

pub async fn handle_auth_errors(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(auth_error) = err.find::<AuthError>() {
        let (status, detail) = match &auth_error {
            AuthError::DuplicateUsername => {
                (StatusCode::BAD_REQUEST, "Username already exists".to_string())
            }
            AuthError::Policy(policy_error) => {
                (StatusCode::UNPROCESSABLE_ENTITY, policy_error.to_string())
            }
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Incorrect username or password".to_string(),
            ),
            AuthError::Token(_) | AuthError::IdentityGone => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".to_string(),
            ),
            AuthError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "an unknown error has occurred".to_string(),
            ),
        };

        let body = warp::reply::json(&json!({ "detail": detail }));
        return Ok(warp::reply::with_status(body, status));
    }

    Err(err)
}

async fn user_register(
    input: RegisterRequest,
    auth: Arc<AuthInner>,
) -> Result<impl Reply, Rejection> {
    let user = auth.register(input, Utc::now()).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&user),
        StatusCode::CREATED,
    ))
}

async fn user_login(input: LoginRequest, auth: Arc<AuthInner>) -> Result<impl Reply, Rejection> {
    let response = auth.login(input, Utc::now()).await?;

    Ok(warp::reply::json(&response))
}

async fn user_get(
    user_id: String,
    _caller: StoredUser,
    auth: Arc<AuthInner>,
) -> Result<impl Reply, Rejection> {
    let user = auth.get_user(&UserId(user_id)).await?;

    Ok(warp::reply::json(&user))
}

async fn user_update(
    user_id: String,
    changes: UserUpdate,
    _caller: StoredUser,
    auth: Arc<AuthInner>,
) -> Result<impl Reply, Rejection> {
    let user = auth
        .update_profile(&UserId(user_id), &changes, Utc::now())
        .await?;

    Ok(warp::reply::json(&user))
}

async fn user_delete(
    user_id: String,
    _caller: StoredUser,
    auth: Arc<AuthInner>,
) -> Result<impl Reply, Rejection> {
    auth.delete_user(&UserId(user_id)).await?;

    Ok(warp::reply::with_status(
        warp::reply::reply(),
        StatusCode::NO_CONTENT,
    ))
}

// Unwrap the bearer token, verify it, and resolve the subject
async fn user_auth_check(
    header: String,
    auth: Arc<AuthInner>,
) -> Result<StoredUser, Rejection> {
    let token = strip_bearer(&header).ok_or(AuthError::Token(TokenError::Malformed))?;

    let user = auth.authenticate(token, Utc::now()).await?;

    Ok(user)
}

/// Strip the (case-insensitive) `Bearer ` scheme prefix from an
/// authorization header value.
fn strip_bearer(header: &str) -> Option<&str> {
    const PREFIX: &str = "bearer ";

    let scheme = header.get(..PREFIX.len())?;

    scheme
        .eq_ignore_ascii_case(PREFIX)
        .then(|| &header[PREFIX.len()..])
}

// functor that adds a reference to the internal auth state into the filter chain
fn with_auth_state(
    auth: Arc<AuthInner>,
) -> impl Filter<Extract = (Arc<AuthInner>,), Error = Infallible> + Clone {
    warp::any().map(move || auth.clone())
}
