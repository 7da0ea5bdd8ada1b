use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines the endpoints reachable without a session: the landing page,
/// the login flow, logout, and registration. Registration is deliberately
/// public — the very first account to register becomes the admin, so there
/// is no one to gate it behind yet.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Landing page. Renders for both anonymous and logged-in visitors;
        // the template only varies the navigation links.
        .route("/", get(handlers::home))
        // GET /login — the login form.
        // POST /login — credential check. On success a session is minted,
        // the cookie set, and the client redirected by role (admins to the
        // host panel, everyone else to the listings).
        .route("/login", get(handlers::login_form).post(handlers::post_login))
        // GET /logout
        // Destroys the server-side session, clears the cookie, and lands on
        // the login page. Safe to hit while anonymous.
        .route("/logout", get(handlers::logout))
        // GET /host/home — the registration form.
        .route("/host/home", get(handlers::register_form))
        // POST /host/home
        // Registration submission, multipart because of the optional
        // profile image. Field validation runs before the image is stored.
        .route("/host/home", post(handlers::register))
}
