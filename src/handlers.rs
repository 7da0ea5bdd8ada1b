//! Request handlers for every route tier.
//!
//! Handlers stay thin: they parse the request into raw fields, call the
//! validation pipeline, drive the repository/session/storage collaborators,
//! and pick a template or redirect. Policy (who may reach a handler) lives
//! in the extractors and route layers, not here.

use axum::{
    body::Bytes,
    extract::{Form, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{self, OptionalIdentity, RequireAdmin, RequireAuth, SESSION_COOKIE},
    error::{AppError, INVALID_CREDENTIALS},
    models::{AccountUpdate, ImageChange, NewAccount, NewListing, ListingUpdate},
    password::hash_password,
    validation::{
        RawFields, validate_account_update, validate_listing, validate_login,
        validate_registration,
    },
    views::{
        self, AccountDetailPage, AccountEditPage, AccountsPage, HomePage, ListingDetailPage,
        ListingFormPage, ListingValues, ListingsPage, LoginPage, NotFoundPage, RegisterPage,
        RegisterSuccessPage, RegisterValues,
    },
};

// --- Multipart plumbing ---

/// One uploaded file pulled out of a multipart body.
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Drain a multipart body into plain text fields plus at most one uploaded
/// file (the last file part wins, matching single-file upload forms). A
/// file part with an empty body counts as "no file chosen".
async fn read_form(mut multipart: Multipart) -> Result<(RawFields, Option<UploadedFile>), AppError> {
    let mut fields = RawFields::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::internal(format!("multipart read error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::internal(format!("multipart read error: {e}")))?;
            if !data.is_empty() {
                file = Some(UploadedFile {
                    filename,
                    content_type,
                    data,
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::internal(format!("multipart read error: {e}")))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, file))
}

// --- Public tier ---

/// GET /
pub async fn home(OptionalIdentity(identity): OptionalIdentity) -> Response {
    views::render(HomePage {
        logged_in: identity.is_some(),
    })
}

/// GET /login
pub async fn login_form() -> Response {
    views::render(LoginPage {
        error: None,
        identifier: String::new(),
    })
}

/// POST /login
///
/// Validation failures re-render the form with every violation; a failed
/// credential check re-renders with the uniform invalid-credentials
/// message. Success mints a session, sets the cookie, and redirects by
/// role: admins land on the host panel, everyone else on the listings.
pub async fn post_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(fields): Form<RawFields>,
) -> Response {
    let data = match validate_login(&fields) {
        Ok(data) => data,
        Err(failure) => {
            let page = LoginPage {
                error: Some(failure.message()),
                identifier: fields.get("emailOrUsername").cloned().unwrap_or_default(),
            };
            return (StatusCode::BAD_REQUEST, views::render(page)).into_response();
        }
    };

    let identity = match auth::authenticate(&state.repo, &data.identifier, &data.password).await {
        Ok(identity) => identity,
        Err(AppError::InvalidCredentials) => {
            let page = LoginPage {
                error: Some(INVALID_CREDENTIALS.to_string()),
                identifier: data.identifier,
            };
            return (StatusCode::UNAUTHORIZED, views::render(page)).into_response();
        }
        Err(err) => return err.into_response(),
    };

    let is_admin = identity.role.is_admin();
    let token = match state.sessions.create(identity).await {
        Ok(token) => token,
        Err(err) => return err.into_response(),
    };

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .build();
    let jar = jar.add(cookie);

    let target = if is_admin { "/index" } else { "/listings" };
    (jar, Redirect::to(target)).into_response()
}

/// GET /logout
///
/// Destroys the server-side session and clears the cookie; always lands on
/// the login page, even for anonymous callers.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.destroy(cookie.value()).await;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login")).into_response()
}

/// GET /host/home — registration form.
pub async fn register_form() -> Response {
    views::render(RegisterPage {
        error: None,
        values: RegisterValues::default(),
    })
}

/// POST /host/home — registration.
///
/// Multipart because of the optional profile image. Field validation runs
/// before the image is stored, so a rejected submission never leaves an
/// orphaned file. The first account ever created becomes the admin; that
/// decision lives in the store, not here.
pub async fn register(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (fields, file) = match read_form(multipart).await {
        Ok(parts) => parts,
        Err(err) => return err.into_response(),
    };

    let values = RegisterValues {
        name: fields.get("name").cloned().unwrap_or_default(),
        username: fields.get("username").cloned().unwrap_or_default(),
        email: fields.get("email").cloned().unwrap_or_default(),
    };

    let data = match validate_registration(&fields) {
        Ok(data) => data,
        Err(failure) => {
            let page = RegisterPage {
                error: Some(failure.message()),
                values,
            };
            return (StatusCode::BAD_REQUEST, views::render(page)).into_response();
        }
    };

    let profile_image = match file {
        Some(upload) => {
            match state
                .storage
                .store_image(&upload.filename, &upload.content_type, &upload.data)
                .await
            {
                Ok(path) => Some(path),
                Err(err) => {
                    let app_err = AppError::from(err);
                    let status = match app_err {
                        AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
                        AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        _ => return app_err.into_response(),
                    };
                    let page = RegisterPage {
                        error: Some(app_err.to_string()),
                        values,
                    };
                    return (status, views::render(page)).into_response();
                }
            }
        }
        None => None,
    };

    let password_hash = match hash_password(&data.password) {
        Ok(hash) => hash,
        Err(err) => return err.into_response(),
    };

    let account = NewAccount {
        name: data.name,
        username: data.username,
        email: data.email,
        password_hash,
        profile_image,
    };

    match state.repo.create_account(account).await {
        Ok(created) => {
            tracing::info!(username = %created.username, role = %created.role, "account created");
            views::render(RegisterSuccessPage)
        }
        Err(AppError::Duplicate) => {
            let page = RegisterPage {
                error: Some(AppError::Duplicate.to_string()),
                values,
            };
            (StatusCode::CONFLICT, views::render(page)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// --- Authenticated tier: listings ---

/// GET /listings
pub async fn listings_index(State(state): State<AppState>) -> Response {
    match state.repo.list_listings().await {
        Ok(listings) => views::render(ListingsPage { listings }),
        Err(err) => err.into_response(),
    }
}

/// GET /listings/new
pub async fn listing_new_form() -> Response {
    views::render(ListingFormPage {
        error: None,
        values: ListingValues::default(),
        action: "/listings".to_string(),
    })
}

/// POST /listings
pub async fn create_listing(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    Form(fields): Form<RawFields>,
) -> Response {
    let values = listing_values(&fields);
    let data = match validate_listing(&fields) {
        Ok(data) => data,
        Err(failure) => {
            let page = ListingFormPage {
                error: Some(failure.message()),
                values,
                action: "/listings".to_string(),
            };
            return (StatusCode::BAD_REQUEST, views::render(page)).into_response();
        }
    };

    let listing = NewListing {
        home: data.home,
        country: data.country,
        city: data.city,
        price: data.price,
        owner: Some(identity.id),
    };

    match state.repo.create_listing(listing).await {
        Ok(created) => Redirect::to(&format!("/listings/{}", created.id)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /listings/{id}
///
/// An unknown id falls back to the index instead of a 404 page.
pub async fn listing_detail(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.repo.find_listing(id).await {
        Ok(Some(listing)) => views::render(ListingDetailPage { listing }),
        Ok(None) => Redirect::to("/listings").into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /listings/{id}/edit
pub async fn listing_edit_form(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.repo.find_listing(id).await {
        Ok(Some(listing)) => views::render(ListingFormPage {
            error: None,
            values: ListingValues {
                home: listing.home,
                country: listing.country,
                city: listing.city,
                price: format_price(listing.price),
            },
            action: format!("/listings/{id}"),
        }),
        Ok(None) => Redirect::to("/listings").into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /listings/{id}
pub async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(fields): Form<RawFields>,
) -> Response {
    let values = listing_values(&fields);
    let data = match validate_listing(&fields) {
        Ok(data) => data,
        Err(failure) => {
            let page = ListingFormPage {
                error: Some(failure.message()),
                values,
                action: format!("/listings/{id}"),
            };
            return (StatusCode::BAD_REQUEST, views::render(page)).into_response();
        }
    };

    let update = ListingUpdate {
        home: data.home,
        country: data.country,
        city: data.city,
        price: data.price,
    };

    match state.repo.update_listing(id, update).await {
        Ok(_) => Redirect::to(&format!("/listings/{id}")).into_response(),
        Err(AppError::NotFound) => Redirect::to("/listings").into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /listings/{id}/delete
pub async fn delete_listing(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.repo.delete_listing(id).await {
        // Deleting a listing that is already gone still lands on the index.
        Ok(()) | Err(AppError::NotFound) => Redirect::to("/listings").into_response(),
        Err(err) => err.into_response(),
    }
}

// --- Admin tier: host management panel ---

/// GET /index — the account grid.
pub async fn accounts_index(State(state): State<AppState>) -> Response {
    match state.repo.list_accounts().await {
        Ok(accounts) => views::render(AccountsPage { accounts }),
        Err(err) => err.into_response(),
    }
}

/// GET /host/home/{id} — one host with their listings.
pub async fn account_detail(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let account = match state.repo.find_account(id).await {
        Ok(Some(account)) => account,
        Ok(None) => return Redirect::to("/").into_response(),
        Err(err) => return err.into_response(),
    };
    match state.repo.listings_by_owner(id).await {
        Ok(listings) => views::render(AccountDetailPage { account, listings }),
        Err(err) => err.into_response(),
    }
}

/// GET /editing/{id} — edit form prefilled from the stored account.
pub async fn account_edit_form(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.repo.find_account(id).await {
        Ok(Some(account)) => views::render(AccountEditPage {
            error: None,
            account,
        }),
        Ok(None) => Redirect::to("/index").into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /editing/update — apply an account edit.
///
/// The target id travels in the form body. The image outcome is resolved
/// here into an explicit change: a new upload replaces, the remove checkbox
/// clears, otherwise the stored image is kept.
pub async fn update_account(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Response {
    let (fields, file) = match read_form(multipart).await {
        Ok(parts) => parts,
        Err(err) => return err.into_response(),
    };

    let data = match validate_account_update(&fields) {
        Ok(data) => data,
        Err(failure) => {
            return match edit_rerender(&state, &fields, failure.message()).await {
                Some(response) => response,
                None => AppError::validation(failure.messages).into_response(),
            };
        }
    };

    let profile_image = match file {
        Some(upload) => {
            match state
                .storage
                .store_image(&upload.filename, &upload.content_type, &upload.data)
                .await
            {
                Ok(path) => ImageChange::Replace(path),
                Err(err) => {
                    let app_err = AppError::from(err);
                    return match edit_rerender(&state, &fields, app_err.to_string()).await {
                        Some(response) => response,
                        None => app_err.into_response(),
                    };
                }
            }
        }
        None if fields.get("removeImage").map(String::as_str) == Some("true") => {
            ImageChange::Remove
        }
        None => ImageChange::Keep,
    };

    let password_hash = match data.password {
        Some(plain) => match hash_password(&plain) {
            Ok(hash) => Some(hash),
            Err(err) => return err.into_response(),
        },
        None => None,
    };

    let update = AccountUpdate {
        name: data.name,
        username: data.username,
        email: data.email,
        password_hash,
        profile_image,
    };

    match state.repo.update_account(data.id, update).await {
        Ok(updated) => {
            tracing::info!(admin = %admin.username, target = %updated.username, "account updated");
            Redirect::to("/index").into_response()
        }
        Err(AppError::Duplicate) => {
            match edit_rerender(&state, &fields, AppError::Duplicate.to_string()).await {
                Some(response) => response,
                None => AppError::Duplicate.into_response(),
            }
        }
        Err(AppError::NotFound) => Redirect::to("/index").into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /delete/{id} — remove an account; its listings stay behind.
pub async fn delete_account(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Response {
    match state.repo.delete_account(id).await {
        Ok(()) => {
            tracing::info!(admin = %admin.username, target = %id, "account deleted");
            Redirect::to("/index").into_response()
        }
        Err(AppError::NotFound) => Redirect::to("/index").into_response(),
        Err(err) => err.into_response(),
    }
}

/// Fallback for unmatched paths.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, views::render(NotFoundPage)).into_response()
}

// --- Helpers ---

fn listing_values(fields: &RawFields) -> ListingValues {
    ListingValues {
        home: fields.get("home").cloned().unwrap_or_default(),
        country: fields.get("country").cloned().unwrap_or_default(),
        city: fields.get("city").cloned().unwrap_or_default(),
        price: fields.get("price").cloned().unwrap_or_default(),
    }
}

/// Trim a trailing `.0` off whole-number prices for form display.
fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        format!("{price}")
    }
}

/// Re-render the edit form with an error, echoing the submitted values so
/// the admin can correct them in place. The stored account still supplies
/// what the form cannot resubmit (id, current profile image). Returns
/// `None` when the id in the form resolves to nothing.
async fn edit_rerender(state: &AppState, fields: &RawFields, message: String) -> Option<Response> {
    let id = Uuid::parse_str(fields.get("id").map(String::as_str).unwrap_or("")).ok()?;
    let mut account = state.repo.find_account(id).await.ok()??;
    if let Some(name) = fields.get("name") {
        account.name = name.clone();
    }
    if let Some(username) = fields.get("username") {
        account.username = username.clone();
    }
    if let Some(email) = fields.get("email") {
        account.email = email.clone();
    }
    let page = AccountEditPage {
        error: Some(message),
        account,
    };
    Some((StatusCode::BAD_REQUEST, views::render(page)).into_response())
}
