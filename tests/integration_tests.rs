//! Integration tests for component interactions.
//!
//! These tests wire the credential store, token service, access checks and
//! repositories together over the in-memory store, and drive the HTTP router
//! for the end-to-end scenarios.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

use api_server::{create_router, AppState};
use auth::{
    AccessControl, AuthError, CredentialStore, HashingConfig, JwtAuth, JwtConfig, ManualClock,
    SecretHasher, TokenError,
};
use ledger_core::db::Stores;
use ledger_core::repository::Repositories;
use ledger_core::types::{
    AccessLevel, BudgetFields, ChargeFields, Role, UserChanges, UserIdentity,
};
use ledger_core::{Caller, Error};

const SECRET: &str = "integration-secret";

fn hasher() -> SecretHasher {
    SecretHasher::new(HashingConfig::minimal()).unwrap()
}

struct World {
    stores: Stores,
    repos: Repositories,
    credentials: CredentialStore,
    tokens: Arc<JwtAuth>,
    access: AccessControl,
}

fn world() -> World {
    let stores = Stores::memory();
    let tokens = Arc::new(JwtAuth::new(JwtConfig::new(SECRET)));
    World {
        repos: Repositories::new(&stores),
        credentials: CredentialStore::new(stores.users.clone(), hasher()),
        access: AccessControl::new(tokens.clone(), stores.users.clone()),
        tokens,
        stores,
    }
}

async fn user(w: &World, name: &str, role: Role) -> UserIdentity {
    w.credentials.create(name, name, role).await.unwrap()
}

fn rent() -> BudgetFields {
    BudgetFields {
        name: "Rent".into(),
        amount: Decimal::new(120000, 2),
        category: None,
        period: Some("monthly".into()),
    }
}

fn groceries() -> ChargeFields {
    ChargeFields {
        name: "Groceries".into(),
        amount: Decimal::new(6350, 2),
        category: "food".into(),
        periodical: None,
    }
}

/// Correct secret verifies, every other secret is a bad credential.
#[tokio::test]
async fn test_verify_accepts_only_the_created_secret() {
    let w = world();
    let pairs = [("alice", "alice"), ("bob", "hunter2"), ("Carol", "ünïcode pass")];

    for (name, secret) in pairs {
        let created = w.credentials.create(name, secret, Role::Standard).await.unwrap();
        assert_eq!(w.credentials.verify(name, secret).await.unwrap(), created);

        let wrongs = vec![
            String::new(),
            "wrong".to_string(),
            secret.to_uppercase(),
            format!("{} ", secret),
        ];
        for wrong in wrongs.iter().filter(|s| s.as_str() != secret) {
            let err = w.credentials.verify(name, wrong).await.unwrap_err();
            assert!(matches!(err, AuthError::BadCredential), "{} / {:?}", name, wrong);
        }
    }
}

/// Tokens validate to their user until the expiry instant, then fail as expired.
#[test]
fn test_token_lifetime_with_clock_seam() {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let tokens = JwtAuth::with_clock(JwtConfig::new(SECRET), clock.clone());

    for user_id in [1_i64, 42, 9_000_000_000] {
        clock.set(start);
        let token = tokens.create_token(user_id).unwrap();

        clock.advance(Duration::hours(23));
        assert_eq!(tokens.validate(&token), Ok(user_id));

        clock.set(start + Duration::hours(24) - Duration::seconds(1));
        assert_eq!(tokens.validate(&token), Ok(user_id));

        clock.set(start + Duration::hours(24));
        assert_eq!(tokens.validate(&token), Err(TokenError::Expired));

        clock.advance(Duration::weeks(1));
        assert_eq!(tokens.validate(&token), Err(TokenError::Expired));
    }
}

/// Create always persists the caller as owner.
#[tokio::test]
async fn test_create_owner_is_caller() {
    let w = world();
    let alice = Caller::new(user(&w, "alice", Role::Standard).await.id);

    let budget = w.repos.budgets.create(&alice, &rent()).await.unwrap();
    let charge = w.repos.charges.create(&alice, &groceries()).await.unwrap();

    assert_eq!(budget.user_id, alice.user_id());
    assert_eq!(charge.user_id, alice.user_id());
}

/// Cross-user update and delete report NotFound and leave the row untouched.
#[tokio::test]
async fn test_cross_user_mutation_is_not_found() {
    let w = world();
    let alice = Caller::new(user(&w, "alice", Role::Standard).await.id);
    let bob = Caller::new(user(&w, "bob", Role::Standard).await.id);

    let budget = w.repos.budgets.create(&bob, &rent()).await.unwrap();
    let charge = w.repos.charges.create(&bob, &groceries()).await.unwrap();

    let mut hijack = rent();
    hijack.amount = Decimal::ZERO;
    let err = w.repos.budgets.update(&alice, budget.id, &hijack).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = w.repos.budgets.delete(&alice, budget.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = w
        .repos
        .charges
        .update(&alice, charge.id, &groceries())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_err!(w.repos.charges.delete(&alice, charge.id).await);

    assert_eq!(w.repos.budgets.list(&bob).await.unwrap(), vec![budget]);
    assert_eq!(w.repos.charges.list(&bob).await.unwrap(), vec![charge]);
}

/// Charge updates keep the server-assigned timestamp.
#[tokio::test]
async fn test_charge_update_preserves_created_at() {
    let w = world();
    let alice = Caller::new(user(&w, "alice", Role::Standard).await.id);
    let charge = w.repos.charges.create(&alice, &groceries()).await.unwrap();

    let mut changed = groceries();
    changed.amount = Decimal::new(7000, 2);
    assert_ok!(w.repos.charges.update(&alice, charge.id, &changed).await);

    let listed = w.repos.charges.list(&alice).await.unwrap();
    assert_eq!(listed[0].amount, Decimal::new(7000, 2));
    assert_eq!(listed[0].created_at, charge.created_at);
}

/// A role downgrade takes effect on the next admin check with the same token.
#[tokio::test]
async fn test_role_downgrade_mid_session() {
    let w = world();
    let admin = user(&w, "root", Role::Admin).await;
    let token = w.tokens.create_token(admin.id).unwrap();

    assert!(w.access.require_admin(&token).await.unwrap());

    w.credentials
        .update(admin.id, "root", None, Role::Standard)
        .await
        .unwrap();

    assert!(!w.access.require_admin(&token).await.unwrap());
    let caller = w.access.caller_from_token(&token).unwrap();
    assert!(matches!(
        w.access.ensure_admin(&caller).await,
        Err(AuthError::Forbidden)
    ));
}

/// Both parties see a share and can end it; a third user can do neither.
#[tokio::test]
async fn test_share_visibility() {
    let w = world();
    let a = Caller::new(user(&w, "alice", Role::Standard).await.id);
    let b = Caller::new(user(&w, "bob", Role::Standard).await.id);
    let c = Caller::new(user(&w, "carol", Role::Standard).await.id);

    let first = w.repos.shares.create(&a, "bob", AccessLevel::ReadOnly).await.unwrap();
    let second = w.repos.shares.create(&a, "bob", AccessLevel::ReadWrite).await.unwrap();
    assert_eq!(first.grantor_id, a.user_id());
    assert_eq!(first.recipient_id, b.user_id());

    assert_eq!(w.repos.shares.list(&a).await.unwrap().len(), 2);
    assert_eq!(w.repos.shares.list(&b).await.unwrap().len(), 2);
    assert!(w.repos.shares.list(&c).await.unwrap().is_empty());

    let err = w.repos.shares.delete(&c, first.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    assert_ok!(w.repos.shares.delete(&b, first.id).await);
    assert_ok!(w.repos.shares.delete(&a, second.id).await);
    assert!(w.repos.shares.list(&a).await.unwrap().is_empty());
}

/// Deleting a user removes their rows and every share naming them.
#[tokio::test]
async fn test_user_delete_cascades() {
    let w = world();
    let alice = Caller::new(user(&w, "alice", Role::Standard).await.id);
    let bob = user(&w, "bob", Role::Standard).await;
    let bob_caller = Caller::new(bob.id);

    w.repos.budgets.create(&bob_caller, &rent()).await.unwrap();
    w.repos.shares.create(&alice, "bob", AccessLevel::ReadOnly).await.unwrap();
    w.repos.shares.create(&bob_caller, "alice", AccessLevel::ReadOnly).await.unwrap();

    w.credentials.delete(bob.id).await.unwrap();

    assert!(w.repos.shares.list(&alice).await.unwrap().is_empty());
    assert!(w.repos.shares.list(&bob_caller).await.unwrap().is_empty());
    assert!(w.repos.budgets.list(&bob_caller).await.unwrap().is_empty());
    assert!(w.stores.users.find_by_id(bob.id).await.unwrap().is_none());
}

/// Concurrent creates of the same username: exactly one wins.
#[tokio::test]
async fn test_concurrent_duplicate_create() {
    let w = world();
    let creds = w.credentials.clone();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let creds = creds.clone();
            tokio::spawn(async move { creds.create("dup", "pw", Role::Standard).await })
        })
        .collect();

    let mut ok = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => ok += 1,
            Err(AuthError::Store(Error::Conflict(_))) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(ok, 1);
}

// ---------------------------------------------------------------------------
// End-to-end over the HTTP router
// ---------------------------------------------------------------------------

async fn app() -> Router {
    let state = AppState::in_memory(SECRET, hasher());
    state.credentials.bootstrap_admin().await.unwrap();
    create_router(Arc::new(state))
}

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    let request = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn login(router: &Router, username: &str, password: &str) -> String {
    let (status, body) = call(
        router,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn admin_creates(router: &Router, admin: &str, name: &str) -> i64 {
    let (status, body) = call(
        router,
        Method::POST,
        "/api/users",
        Some(admin),
        Some(json!({ "username": name, "password": name, "role": "standard" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_end_to_end_alice_rent_budget() {
    let router = app().await;
    let admin = login(&router, "admin", "admin").await;
    let alice_id = admin_creates(&router, &admin, "alice").await;
    admin_creates(&router, &admin, "bob").await;

    let alice = login(&router, "alice", "alice").await;
    let (status, created) = call(
        &router,
        Method::POST,
        "/api/budgets",
        Some(&alice),
        Some(json!({ "name": "Rent", "amount": 1200.00, "period": "monthly" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, listed) = call(&router, Method::GET, "/api/budgets", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], created);
    assert_eq!(listed[0]["name"], "Rent");
    assert_eq!(listed[0]["period"], "monthly");
    assert_eq!(listed[0]["user_id"], alice_id);
    let amount: Decimal = serde_json::from_value(listed[0]["amount"].clone()).unwrap();
    assert_eq!(amount, Decimal::new(120000, 2));

    let bob = login(&router, "bob", "bob").await;
    let (status, listed) = call(&router, Method::GET, "/api/budgets", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_end_to_end_admin_deletes_bob() {
    let router = app().await;
    let admin = login(&router, "admin", "admin").await;
    admin_creates(&router, &admin, "alice").await;
    let bob_id = admin_creates(&router, &admin, "bob").await;

    let alice = login(&router, "alice", "alice").await;
    let bob = login(&router, "bob", "bob").await;

    let (status, _) = call(
        &router,
        Method::POST,
        "/api/shares",
        Some(&alice),
        Some(json!({ "shareUsername": "bob", "access": "read-only" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(
        &router,
        Method::POST,
        "/api/shares",
        Some(&bob),
        Some(json!({ "shareUsername": "alice", "access": "read-write" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(
        &router,
        Method::DELETE,
        &format!("/api/users/{}", bob_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, shares) = call(&router, Method::GET, "/api/shares", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(shares.as_array().unwrap().is_empty());

    // Bob's token is still signed and unexpired, but he no longer owns anything.
    let (status, shares) = call(&router, Method::GET, "/api/shares", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(shares.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_end_to_end_demoted_admin_forbidden() {
    let router = app().await;
    let admin = login(&router, "admin", "admin").await;
    let carol_id = admin_creates(&router, &admin, "carol").await;

    let (status, _) = call(
        &router,
        Method::PUT,
        &format!("/api/users/{}", carol_id),
        Some(&admin),
        Some(json!({ "username": "carol", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let carol = login(&router, "carol", "carol").await;
    let (status, _) = call(&router, Method::GET, "/api/users", Some(&carol), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &router,
        Method::PUT,
        &format!("/api/users/{}", carol_id),
        Some(&admin),
        Some(json!({ "username": "carol", "role": "standard" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&router, Method::GET, "/api/users", Some(&carol), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_memory_user_store_direct_update() {
    let w = world();
    let alice = user(&w, "alice", Role::Standard).await;
    let changes = UserChanges {
        username: "alice2".into(),
        password_hash: None,
        role: Role::Standard,
    };
    assert_eq!(w.stores.users.update(alice.id, &changes).await.unwrap(), 1);
    assert_ok!(w.credentials.verify("alice2", "alice").await);
}
