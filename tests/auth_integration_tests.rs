mod common;

use axum::{
    extract::FromRequestParts,
    http::{Request, header},
};
use homestay::{
    Repository, SessionStore,
    auth::{AdminRejection, OptionalIdentity, RequireAdmin, RequireAuth, SESSION_COOKIE},
    error::AppError,
    models::{Identity, NewAccount, Role},
    password::hash_password,
};

use common::test_state;

async fn seed_account(
    harness: &common::TestHarness,
    username: &str,
    email: &str,
    password: &str,
) -> Identity {
    let account = harness
        .repo
        .create_account(NewAccount {
            name: "Test Person".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            profile_image: None,
        })
        .await
        .unwrap();
    Identity {
        id: account.id,
        username: account.username,
        email: account.email,
        role: account.role,
    }
}

// --- authenticate ---

#[tokio::test]
async fn authenticate_by_username() {
    let harness = test_state();
    let seeded = seed_account(&harness, "ada_l", "ada@example.com", "s3cretpw").await;

    let identity = homestay::auth::authenticate(&harness.state.repo, "ada_l", "s3cretpw")
        .await
        .unwrap();
    assert_eq!(identity, seeded);
    // First account in an empty store is the admin.
    assert_eq!(identity.role, Role::Admin);
}

#[tokio::test]
async fn authenticate_by_email_is_case_insensitive() {
    let harness = test_state();
    seed_account(&harness, "ada_l", "ada@example.com", "s3cretpw").await;

    let identity =
        homestay::auth::authenticate(&harness.state.repo, "Ada@Example.COM", "s3cretpw")
            .await
            .unwrap();
    assert_eq!(identity.username, "ada_l");
}

#[tokio::test]
async fn failure_causes_are_indistinguishable() {
    let harness = test_state();
    seed_account(&harness, "ada_l", "ada@example.com", "s3cretpw").await;

    // Wrong password and unknown identifier must collapse into the same
    // external error so accounts cannot be enumerated.
    let wrong_password =
        homestay::auth::authenticate(&harness.state.repo, "ada_l", "wrong").await;
    let unknown_user =
        homestay::auth::authenticate(&harness.state.repo, "nobody", "s3cretpw").await;

    assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
    assert!(matches!(unknown_user, Err(AppError::InvalidCredentials)));
}

// --- extractors ---

fn parts_with_cookie(token: Option<&str>) -> axum::http::request::Parts {
    let builder = Request::builder().uri("/listings");
    let builder = match token {
        Some(token) => builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}")),
        None => builder,
    };
    builder.body(()).unwrap().into_parts().0
}

#[tokio::test]
async fn optional_identity_resolves_both_ways() {
    let harness = test_state();
    let seeded = seed_account(&harness, "ada_l", "ada@example.com", "s3cretpw").await;
    let token = harness.sessions.create(seeded.clone()).await.unwrap();

    let mut anon = parts_with_cookie(None);
    let OptionalIdentity(resolved) =
        OptionalIdentity::from_request_parts(&mut anon, &harness.state)
            .await
            .unwrap();
    assert!(resolved.is_none());

    let mut authed = parts_with_cookie(Some(&token));
    let OptionalIdentity(resolved) =
        OptionalIdentity::from_request_parts(&mut authed, &harness.state)
            .await
            .unwrap();
    assert_eq!(resolved, Some(seeded));
}

#[tokio::test]
async fn require_auth_rejects_anonymous_and_stale_tokens() {
    let harness = test_state();
    let seeded = seed_account(&harness, "ada_l", "ada@example.com", "s3cretpw").await;
    let token = harness.sessions.create(seeded).await.unwrap();

    let mut anon = parts_with_cookie(None);
    assert!(
        RequireAuth::from_request_parts(&mut anon, &harness.state)
            .await
            .is_err()
    );

    let mut authed = parts_with_cookie(Some(&token));
    assert!(
        RequireAuth::from_request_parts(&mut authed, &harness.state)
            .await
            .is_ok()
    );

    // A destroyed session behaves exactly like no session.
    harness.sessions.destroy(&token).await;
    let mut stale = parts_with_cookie(Some(&token));
    assert!(
        RequireAuth::from_request_parts(&mut stale, &harness.state)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn require_admin_distinguishes_its_rejections() {
    let harness = test_state();
    // First account is the admin, second is a plain user.
    let admin = seed_account(&harness, "admin_1", "admin@example.com", "s3cretpw").await;
    let user = seed_account(&harness, "user_1", "user@example.com", "s3cretpw").await;
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(user.role, Role::User);

    let admin_token = harness.sessions.create(admin).await.unwrap();
    let user_token = harness.sessions.create(user).await.unwrap();

    let mut anon = parts_with_cookie(None);
    let rejection = RequireAdmin::from_request_parts(&mut anon, &harness.state)
        .await
        .unwrap_err();
    assert!(matches!(rejection, AdminRejection::NotLoggedIn));

    let mut as_user = parts_with_cookie(Some(&user_token));
    let rejection = RequireAdmin::from_request_parts(&mut as_user, &harness.state)
        .await
        .unwrap_err();
    assert!(matches!(rejection, AdminRejection::Forbidden));

    let mut as_admin = parts_with_cookie(Some(&admin_token));
    let RequireAdmin(identity) =
        RequireAdmin::from_request_parts(&mut as_admin, &harness.state)
            .await
            .unwrap();
    assert_eq!(identity.username, "admin_1");
}
