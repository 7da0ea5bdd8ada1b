//! Askama template definitions.
//!
//! The handlers only pick a template and its data; rendering is this
//! module's concern. Free-text stored values are already escaped by the
//! validation pipeline, and askama escapes again on output, matching the
//! double-escaping behavior of the templated original.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::models::{Listing, UserAccount};

/// Render a template, collapsing renderer failures into a generic 500.
pub fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("template render error: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub logged_in: bool,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
    /// Previously-entered identifier, echoed back on failure.
    pub identifier: String,
}

/// Previously-entered registration values for form re-renders.
#[derive(Default, Clone)]
pub struct RegisterValues {
    pub name: String,
    pub username: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub error: Option<String>,
    pub values: RegisterValues,
}

#[derive(Template)]
#[template(path = "register_success.html")]
pub struct RegisterSuccessPage;

#[derive(Template)]
#[template(path = "accounts.html")]
pub struct AccountsPage {
    pub accounts: Vec<UserAccount>,
}

#[derive(Template)]
#[template(path = "account_detail.html")]
pub struct AccountDetailPage {
    pub account: UserAccount,
    pub listings: Vec<Listing>,
}

#[derive(Template)]
#[template(path = "account_edit.html")]
pub struct AccountEditPage {
    pub error: Option<String>,
    pub account: UserAccount,
}

/// Previously-entered listing values for form re-renders.
#[derive(Default, Clone)]
pub struct ListingValues {
    pub home: String,
    pub country: String,
    pub city: String,
    pub price: String,
}

#[derive(Template)]
#[template(path = "listing_form.html")]
pub struct ListingFormPage {
    pub error: Option<String>,
    pub values: ListingValues,
    /// Form post target: `/listings` on create, `/listings/{id}` on edit.
    pub action: String,
}

#[derive(Template)]
#[template(path = "listings.html")]
pub struct ListingsPage {
    pub listings: Vec<Listing>,
}

#[derive(Template)]
#[template(path = "listing_detail.html")]
pub struct ListingDetailPage {
    pub listing: Listing,
}

#[derive(Template)]
#[template(path = "denied.html")]
pub struct DeniedPage {
    pub message: String,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage;
