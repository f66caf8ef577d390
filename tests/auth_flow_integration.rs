//! Integration tests for the login REST flow.
//!
//! Each test wires the real router over an in-memory database and drives it
//! through `tower::ServiceExt::oneshot` — no stubs between the HTTP surface
//! and the store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use market_identity::account::model::{
    Account, Generation, LifecycleState, ParticipantType, Surface,
};
use market_identity::account::LifecycleManager;
use market_identity::auth::{AuthRouteState, AuthService, auth_routes};
use market_identity::notify::NotificationAddressUpdater;
use market_identity::otp::{ChallengeGate, StoredChallengeGate};
use market_identity::profile::{ApprovalState, Profile, RequiredDocuments};
use market_identity::session::{JwtSigner, SessionIssuer};
use market_identity::store::{
    AccountStore, ChallengeStore, LibSqlBackend, ProfileStore,
};

/// Build the full router over a fresh in-memory database.
async fn test_app() -> (Router, Arc<LibSqlBackend>) {
    let backend = Arc::new(LibSqlBackend::new_memory().await.unwrap());

    let accounts: Arc<dyn AccountStore> = backend.clone();
    let profiles: Arc<dyn ProfileStore> = backend.clone();
    let challenges: Arc<dyn ChallengeStore> = backend.clone();

    let lifecycle = LifecycleManager::new(Arc::clone(&accounts));
    let gate: Arc<dyn ChallengeGate> = Arc::new(StoredChallengeGate::new(
        challenges,
        chrono::Duration::minutes(5),
        6,
    ));
    let issuer = SessionIssuer::new(
        Arc::new(JwtSigner::new(&SecretString::from("integration-test-secret"))),
        chrono::Duration::hours(12),
    );
    let notifier = NotificationAddressUpdater::new(Arc::clone(&accounts));

    let service = Arc::new(AuthService::new(
        lifecycle, profiles, gate, issuer, notifier,
    ));
    (auth_routes(AuthRouteState { service }), backend)
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_with_bearer(app: &Router, path: &str, token: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(path)
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Full challenge + verify round trip; returns the verify response body.
async fn login(app: &Router, phone: &str, surface: &str, join_type: Option<&str>) -> Value {
    let (status, challenge) = post_json(
        app,
        "/api/auth/challenge",
        json!({ "phone_number": phone, "surface": surface }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "challenge failed: {challenge}");
    let code = challenge["challenge_code"].as_str().unwrap().to_string();

    let mut body = json!({ "phone_number": phone, "code": code, "surface": surface });
    if let Some(join) = join_type {
        body["join_type"] = json!(join);
    }
    let (status, verified) = post_json(app, "/api/auth/verify", body).await;
    assert_eq!(status, StatusCode::OK, "verify failed: {verified}");
    verified
}

fn seed_account(
    phone: &str,
    surface: Option<Surface>,
    participant: ParticipantType,
    generation: Generation,
    lifecycle: LifecycleState,
) -> Account {
    let now = Utc::now();
    let mut account = Account::new_current(
        phone,
        surface.unwrap_or(Surface::Vendor),
        participant,
        now,
    );
    account.surface = surface;
    account.generation = generation;
    account.lifecycle_state = lifecycle;
    account
}

#[tokio::test]
async fn malformed_phone_is_rejected() {
    let (app, _backend) = test_app().await;
    let (status, body) = post_json(
        &app,
        "/api/auth/challenge",
        json!({ "phone_number": "12345", "surface": "vendor" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("10 digits"));
}

#[tokio::test]
async fn wrong_challenge_code_is_rejected() {
    let (app, _backend) = test_app().await;
    let (status, _) = post_json(
        &app,
        "/api/auth/challenge",
        json!({ "phone_number": "9876500000", "surface": "vendor" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &app,
        "/api/auth/verify",
        json!({ "phone_number": "9876500000", "code": "000000", "surface": "vendor" }),
    )
    .await;
    // A 1-in-a-million collision with the random code would make this OK;
    // treat only the expected rejection as meaningful.
    if status != StatusCode::OK {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Challenge code"));
    }
}

#[tokio::test]
async fn first_vendor_login_creates_unset_and_is_idempotent() {
    let (app, _backend) = test_app().await;

    let (status, challenge) = post_json(
        &app,
        "/api/auth/challenge",
        json!({ "phone_number": "987-650-0000", "surface": "vendor" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(challenge["is_new_account"], json!(true));
    assert!(challenge.get("account_id").is_none());

    let first = login(&app, "9876500000", "vendor", Some("business")).await;
    assert_eq!(first["account"]["participant_type"], json!("unset"));
    assert_eq!(first["account"]["generation"], json!("current"));
    // Unset: nothing allowed yet, retail signup shown by default.
    assert_eq!(first["active_dashboard"], json!("retail"));
    assert_eq!(first["allowed_dashboards"], json!([]));

    let second = login(&app, "9876500000", "vendor", Some("business")).await;
    assert_eq!(second["account"]["id"], first["account"]["id"]);

    // The account now resolves on subsequent challenges.
    let (_, challenge) = post_json(
        &app,
        "/api/auth/challenge",
        json!({ "phone_number": "9876500000", "surface": "vendor" }),
    )
    .await;
    assert_eq!(challenge["is_new_account"], json!(false));
    assert_eq!(challenge["account_id"], first["account"]["id"]);
    assert_eq!(challenge["participant_type"], json!("unset"));
}

#[tokio::test]
async fn delivery_account_rejects_business_join() {
    let (app, backend) = test_app().await;
    let account = seed_account(
        "9876500001",
        Some(Surface::Vendor),
        ParticipantType::Delivery,
        Generation::Current,
        LifecycleState::Active,
    );
    backend.create_if_absent(&account).await.unwrap();

    let (status, challenge) = post_json(
        &app,
        "/api/auth/challenge",
        json!({ "phone_number": "9876500001", "surface": "vendor" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let code = challenge["challenge_code"].as_str().unwrap();

    let (status, body) = post_json(
        &app,
        "/api/auth/verify",
        json!({
            "phone_number": "9876500001",
            "code": code,
            "surface": "vendor",
            "join_type": "business"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("incompatible"));
}

#[tokio::test]
async fn legacy_account_is_exempt_from_the_delivery_wall() {
    let (app, backend) = test_app().await;
    // Untagged legacy retail row.
    let account = seed_account(
        "9876500002",
        None,
        ParticipantType::Retail,
        Generation::Legacy,
        LifecycleState::Active,
    );
    backend.create_if_absent(&account).await.unwrap();

    let verified = login(&app, "9876500002", "vendor", Some("delivery")).await;
    assert_eq!(verified["account"]["generation"], json!("legacy"));
    assert_eq!(verified["account"]["participant_type"], json!("retail"));
}

#[tokio::test]
async fn soft_deleted_business_reactivates_to_unset() {
    let (app, backend) = test_app().await;
    let account = seed_account(
        "9876500003",
        Some(Surface::Vendor),
        ParticipantType::Business,
        Generation::Current,
        LifecycleState::SoftDeleted,
    );
    backend.create_if_absent(&account).await.unwrap();

    let verified = login(&app, "9876500003", "vendor", None).await;
    assert_eq!(verified["account"]["participant_type"], json!("unset"));
    assert_eq!(verified["account"]["lifecycle_state"], json!("active"));
    assert_eq!(verified["account"]["id"], json!(account.id.to_string()));
}

#[tokio::test]
async fn soft_deleted_delivery_reactivates_to_delivery() {
    let (app, backend) = test_app().await;
    let account = seed_account(
        "9876500004",
        Some(Surface::Vendor),
        ParticipantType::Delivery,
        Generation::Current,
        LifecycleState::SoftDeleted,
    );
    backend.create_if_absent(&account).await.unwrap();

    let verified = login(&app, "9876500004", "vendor", None).await;
    assert_eq!(verified["account"]["participant_type"], json!("delivery"));
    assert_eq!(verified["active_dashboard"], json!("delivery"));
    assert_eq!(verified["allowed_dashboards"], json!(["delivery"]));
}

#[tokio::test]
async fn operator_accounts_are_turned_away_at_challenge() {
    let (app, backend) = test_app().await;
    let account = seed_account(
        "9876500005",
        Some(Surface::Vendor),
        ParticipantType::AdminOperator,
        Generation::Current,
        LifecycleState::Active,
    );
    backend.create_if_absent(&account).await.unwrap();

    let (status, body) = post_json(
        &app,
        "/api/auth/challenge",
        json!({ "phone_number": "9876500005", "surface": "vendor" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("admin console"));
}

#[tokio::test]
async fn customer_and_vendor_logins_stay_independent() {
    let (app, _backend) = test_app().await;

    let customer = login(&app, "9876500006", "customer", None).await;
    assert_eq!(customer["account"]["participant_type"], json!("customer"));
    // Customer surface: no dashboards at all.
    assert!(customer.get("active_dashboard").is_none());
    assert_eq!(customer["allowed_dashboards"], json!([]));

    let vendor = login(&app, "9876500006", "vendor", Some("retail")).await;
    assert_eq!(vendor["account"]["participant_type"], json!("unset"));
    assert_ne!(vendor["account"]["id"], customer["account"]["id"]);
}

#[tokio::test]
async fn incomplete_profile_reads_new_account_despite_stale_approval() {
    let (app, backend) = test_app().await;
    let account = seed_account(
        "9876500007",
        Some(Surface::Vendor),
        ParticipantType::Business,
        Generation::Current,
        LifecycleState::Active,
    );
    backend.create_if_absent(&account).await.unwrap();

    // Complete except tax_id, but already flagged approved.
    let mut profile = Profile::empty(account.id, Utc::now());
    profile.company_name = Some("Moonrise Trading Co".to_string());
    profile.documents = RequiredDocuments {
        business_registration: Some("docs/reg.pdf".to_string()),
        tax_certificate: Some("docs/tax.pdf".to_string()),
        bank_passbook: Some("docs/bank.pdf".to_string()),
        storefront_photo: Some("docs/front.jpg".to_string()),
    };
    profile.approval_state = ApprovalState::Approved;
    backend.upsert_profile(&profile).await.unwrap();

    let verified = login(&app, "9876500007", "vendor", None).await;
    assert_eq!(verified["business_onboarding_status"], json!("new_account"));
    assert_eq!(verified["allowed_dashboards"], json!([]));
}

#[tokio::test]
async fn complete_approved_business_gets_its_dashboard() {
    let (app, backend) = test_app().await;
    let account = seed_account(
        "9876500008",
        Some(Surface::Vendor),
        ParticipantType::Business,
        Generation::Current,
        LifecycleState::Active,
    );
    backend.create_if_absent(&account).await.unwrap();

    let mut profile = Profile::empty(account.id, Utc::now());
    profile.company_name = Some("Moonrise Trading Co".to_string());
    profile.tax_id = Some("123-45-67890".to_string());
    profile.documents = RequiredDocuments {
        business_registration: Some("docs/reg.pdf".to_string()),
        tax_certificate: Some("docs/tax.pdf".to_string()),
        bank_passbook: Some("docs/bank.pdf".to_string()),
        storefront_photo: Some("docs/front.jpg".to_string()),
    };
    profile.approval_state = ApprovalState::Approved;
    backend.upsert_profile(&profile).await.unwrap();

    let verified = login(&app, "9876500008", "vendor", None).await;
    assert_eq!(verified["business_onboarding_status"], json!("approved"));
    assert_eq!(verified["allowed_dashboards"], json!(["business"]));
    assert_eq!(verified["active_dashboard"], json!("business"));
}

#[tokio::test]
async fn issued_session_echoes_back_and_garbage_is_unauthorized() {
    let (app, _backend) = test_app().await;

    let verified = login(&app, "9876500009", "customer", None).await;
    let token = verified["session_token"].as_str().unwrap();

    let (status, claim) = get_with_bearer(&app, "/api/auth/session", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claim["account_id"], verified["account"]["id"]);
    assert_eq!(claim["phone_number"], json!("9876500009"));
    assert_eq!(claim["participant_type"], json!("customer"));
    // The claim never carries profile or secret fields.
    assert!(claim.get("notification_address").is_none());

    let (status, _) = get_with_bearer(&app, "/api/auth/session", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn notification_address_lands_off_the_login_path() {
    let (app, backend) = test_app().await;

    let (status, challenge) = post_json(
        &app,
        "/api/auth/challenge",
        json!({ "phone_number": "9876500010", "surface": "customer" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let code = challenge["challenge_code"].as_str().unwrap();

    let (status, verified) = post_json(
        &app,
        "/api/auth/verify",
        json!({
            "phone_number": "9876500010",
            "code": code,
            "surface": "customer",
            "notification_address": "push-token-abc"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = uuid::Uuid::parse_str(verified["account"]["id"].as_str().unwrap()).unwrap();

    // The write is detached; give it a moment to land.
    for _ in 0..20 {
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        let account = backend.get_account(id).await.unwrap().unwrap();
        if account.notification_address.as_deref() == Some("push-token-abc") {
            return;
        }
    }
    panic!("notification address never landed");
}
