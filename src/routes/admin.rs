use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// The host management panel: the account grid plus per-account detail,
/// edit, and delete operations.
///
/// Access Control:
/// This entire router is wrapped (in `create_router`) in a route layer
/// running the `RequireAdmin` extractor. Anonymous callers are redirected
/// to `/login`; authenticated non-admins receive an explicit 403 page. The
/// two outcomes stay distinguishable so a logged-in user is never bounced
/// back to a login form they already passed.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /index
        // The account grid: every registered account with edit/delete
        // affordances.
        .route("/index", get(handlers::accounts_index))
        // GET /host/home/{id}
        // One host's detail page, including the listings they own. Unknown
        // ids fall back to the landing page.
        .route("/host/home/{id}", get(handlers::account_detail))
        // GET /editing/{id} — edit form prefilled from the stored account.
        .route("/editing/{id}", get(handlers::account_edit_form))
        // POST /editing/update
        // Applies an account edit; the target id travels in the form body.
        // Multipart because of the optional profile-image replacement.
        .route("/editing/update", post(handlers::update_account))
        // POST /delete/{id}
        // Removes the account. Its listings stay behind with an orphaned
        // owner reference.
        .route("/delete/{id}", post(handlers::delete_account))
}
