//! Authentication state machine and access-control gate.
//!
//! Per-request identity resolution is done by extractors: the session
//! cookie is resolved against the session store into either a full
//! `Identity` snapshot or an explicit "no identity" — never a
//! partially-populated value. `RequireAuth` and `RequireAdmin` are the two
//! gate predicates; their rejections encode the redirect/forbidden policy
//! so handlers never re-implement it.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    error::AppError,
    models::Identity,
    password::verify_password,
    repository::RepositoryState,
    session::SessionState,
    views::{self, DeniedPage},
};

/// Name of the cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "homestay_session";

/// Anonymous -> Authenticated transition.
///
/// Succeeds iff an account matches the identifier (exact username, or
/// case-insensitive email) and the password verifies against its stored
/// hash. Both failure causes collapse into the same external error; they
/// are only distinguished in the logs.
pub async fn authenticate(
    repo: &RepositoryState,
    identifier: &str,
    password: &str,
) -> Result<Identity, AppError> {
    let account = match repo.find_account_by_identifier(identifier).await? {
        Some(account) => account,
        None => {
            tracing::debug!(identifier, "login rejected: unknown identifier");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(password, &account.password_hash) {
        tracing::debug!(identifier, "login rejected: password mismatch");
        return Err(AppError::InvalidCredentials);
    }

    Ok(Identity {
        id: account.id,
        username: account.username,
        email: account.email,
        role: account.role,
    })
}

/// Resolve the session cookie on a request into an identity snapshot.
async fn resolve_identity<S>(parts: &Parts, state: &S) -> Option<Identity>
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    let sessions = SessionState::from_ref(state);
    sessions.get(&token).await
}

/// OptionalIdentity
///
/// Infallible extractor for pages that render for both anonymous and
/// authenticated visitors.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(resolve_identity(parts, state).await))
    }
}

/// Rejection for `RequireAuth`: anonymous requests are sent to the login
/// entry point with no data and no error body.
#[derive(Debug)]
pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

/// RequireAuth
///
/// Gate predicate: the request must carry a live session. Used both as a
/// route-layer middleware argument and directly in handlers that need the
/// identity.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Identity);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        resolve_identity(parts, state)
            .await
            .map(RequireAuth)
            .ok_or(LoginRedirect)
    }
}

/// Rejection for `RequireAdmin`. The two outcomes stay distinguishable:
/// anonymous callers are redirected to login, authenticated non-admins get
/// an explicit forbidden page.
#[derive(Debug)]
pub enum AdminRejection {
    NotLoggedIn,
    Forbidden,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            AdminRejection::NotLoggedIn => Redirect::to("/login").into_response(),
            AdminRejection::Forbidden => {
                let page = DeniedPage {
                    message: "Access Denied: Admin privileges required".to_string(),
                };
                (StatusCode::FORBIDDEN, views::render(page)).into_response()
            }
        }
    }
}

/// RequireAdmin
///
/// Gate predicate for the host management panel and account grid.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Identity);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    SessionState: FromRef<S>,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match resolve_identity(parts, state).await {
            None => Err(AdminRejection::NotLoggedIn),
            Some(identity) if identity.role.is_admin() => Ok(RequireAdmin(identity)),
            Some(identity) => {
                tracing::debug!(user = %identity.username, "admin route denied");
                Err(AdminRejection::Forbidden)
            }
        }
    }
}
