use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// The listings catalogue: browsing, creating, editing, and deleting
/// property listings. Every account role may use these routes.
///
/// Access Control Strategy:
/// The whole module is wrapped (in `create_router`) in a route layer that
/// runs the `RequireAuth` extractor before any handler. Anonymous requests
/// never reach a handler here; they are redirected to `/login` by the
/// extractor's rejection.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /listings
        // The full catalogue, most recent first.
        .route("/listings", get(handlers::listings_index))
        // GET /listings/new — empty listing form.
        .route("/listings/new", get(handlers::listing_new_form))
        // POST /listings
        // Creates a listing owned by the authenticated account and
        // redirects to its detail page.
        .route("/listings", post(handlers::create_listing))
        // GET /listings/{id} — detail page; unknown ids fall back to the
        // catalogue rather than a 404.
        // POST /listings/{id} — applies an edit after validation.
        .route(
            "/listings/{id}",
            get(handlers::listing_detail).post(handlers::update_listing),
        )
        // GET /listings/{id}/edit — form prefilled from the stored listing.
        .route("/listings/{id}/edit", get(handlers::listing_edit_form))
        // POST /listings/{id}/delete
        // Removes the listing and returns to the catalogue. Deleting an
        // already-gone listing lands on the catalogue too.
        .route("/listings/{id}/delete", post(handlers::delete_listing))
}
