//! End-to-end walk through the application lifecycle over the HTTP
//! surface: seed from profile, fill the form, stage documents, save,
//! submit, observe a reviewer decision, and start over after rejection.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use applyflow::application::memory::{MemoryProfiles, MemorySnapshots, MemoryStore, TracingNotifier};
use applyflow::application::{
    application_router, ApplicationService, ApplicationStatus, ApplicationStore, EnginePolicy,
    SharedService, StudentProfile, UserContext, UserId,
};

type SharedEngine = SharedService<MemoryStore, MemoryProfiles, MemorySnapshots, TracingNotifier>;

fn student() -> UserContext {
    UserContext {
        user_id: UserId("stu-e2e".to_string()),
        email: "dev@example.edu".to_string(),
        authenticated: true,
    }
}

fn profile() -> StudentProfile {
    StudentProfile {
        full_name: "Devika Nair".to_string(),
        email: "dev@example.edu".to_string(),
        phone: "+91 98 7654 3210".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2003, 7, 2),
        gender: "female".to_string(),
        institution: "National Institute of Design".to_string(),
        program: "Interaction Design".to_string(),
    }
}

async fn build_engine() -> (Arc<MemoryStore>, SharedEngine) {
    let user = student();
    let store = Arc::new(MemoryStore::default());
    let mut service = ApplicationService::new(
        store.clone(),
        Arc::new(MemoryProfiles::with_profile(&user, profile())),
        Arc::new(MemorySnapshots::default()),
        Arc::new(TracingNotifier),
        EnginePolicy::default(),
        user,
    );
    service.load().await.expect("initial load succeeds");
    (store, Arc::new(Mutex::new(service)))
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json body")
}

async fn patch(router: &axum::Router, path: &str, body: Value) -> Value {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
                .expect("request"),
        )
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK, "PATCH {path}");
    read_json(response).await
}

async fn post(router: &axum::Router, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).expect("serialize")),
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(body)
                .expect("request"),
        )
        .await
        .expect("router dispatch");
    let status = response.status();
    (status, read_json(response).await)
}

fn png_payload(filename: &str) -> Value {
    json!({
        "filename": filename,
        "content_type": "image/png",
        "data": BASE64.encode([0x89, b'P', b'N', b'G', 0, 1, 2, 3]),
    })
}

async fn fill_form(router: &axum::Router) {
    patch(
        router,
        "/api/v1/application/personal-info",
        json!({
            "street": "4 Paldi Road",
            "city": "Ahmedabad",
            "state": "Gujarat",
            "postal_code": "380007",
            "country": "India",
        }),
    )
    .await;
    patch(
        router,
        "/api/v1/application/education",
        json!({ "degree": "BDes", "year": 4 }),
    )
    .await;
    patch(
        router,
        "/api/v1/application/technical",
        json!({ "skills": ["Rust", "Figma"], "github_url": "https://github.com/devika" }),
    )
    .await;
    patch(
        router,
        "/api/v1/application/identity-proof",
        json!({ "document_type": "passport", "document_number": "Z9876543" }),
    )
    .await;
    patch(
        router,
        "/api/v1/application/college-id",
        json!({ "document_number": "NID-21-338" }),
    )
    .await;
    patch(
        router,
        "/api/v1/application/details",
        json!({
            "motivation": "Design tools should feel instant.",
            "goals": "Build interfaces for systems software.",
        }),
    )
    .await;

    for (slot, filename) in [("identity", "passport.png"), ("college-id", "id-card.png")] {
        let (status, _) = post(
            router,
            &format!("/api/v1/application/documents/{slot}"),
            Some(png_payload(filename)),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "stage {slot}");
    }
}

#[tokio::test]
async fn draft_to_decision_round_trip() {
    let (store, engine) = build_engine().await;
    let router = application_router(engine);

    // Load seeded the profile fields; the form starts partially complete.
    let view = read_json(
        router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/application")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch"),
    )
    .await;
    assert_eq!(view["status"], "draft");
    assert_eq!(view["draft"]["personal_info"]["full_name"], "Devika Nair");
    assert!(view["completion"]["percentage"].as_u64() < Some(100));

    // Submitting too early never leaves the client.
    let (status, payload) = post(&router, "/api/v1/application/submit", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(payload["error"].as_str().is_some());

    fill_form(&router).await;

    // A full form saves remotely and submits.
    let (status, payload) = post(&router, "/api/v1/application/save", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["saved"], "remote");

    let (status, payload) = post(&router, "/api/v1/application/submit", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(payload["status"], "submitted");

    // The form is now read-only.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/v1/application/education")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({ "year": 2 })).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // A reviewer rejects the application out of band.
    store.decide(
        &student(),
        ApplicationStatus::Rejected,
        "college id is unreadable",
    );
    let (status, payload) = post(&router, "/api/v1/application/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "rejected");
    assert_eq!(payload["form_visible"], false);

    // The rejection comment is visible on the view.
    let view = read_json(
        router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/application")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch"),
    )
    .await;
    assert_eq!(view["review"]["comment"], "college id is unreadable");

    // Starting over goes back to the profile seed with empty slots.
    let (status, report) = post(&router, "/api/v1/application/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(report["percentage"].as_u64() < Some(100));
    assert!(report["missing_fields"]
        .as_array()
        .expect("missing fields")
        .iter()
        .any(|field| field == "Identity Document Image"));

    let view = read_json(
        router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/application")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch"),
    )
    .await;
    assert_eq!(view["status"], "draft");
    assert_eq!(view["form_visible"], true);
    assert_eq!(view["draft"]["education"]["degree"], "");
}

#[tokio::test]
async fn server_normalizes_wire_dates_on_load() {
    // A remote record written with split date parts comes back canonical.
    let user = student();
    let store = Arc::new(MemoryStore::default());
    let record: applyflow::application::RemoteApplication = serde_json::from_value(json!({
        "draft": {
            "personal_info": {
                "full_name": "Devika Nair",
                "email": "dev@example.edu",
                "date_of_birth": { "year": 2003, "month": 7, "day": 2 },
            },
        },
        "status": "draft",
    }))
    .expect("wire record decodes");

    // Seed the store through its public save path.
    store.save(&user, &record.draft).await.expect("seed store");

    let mut service = ApplicationService::new(
        store,
        Arc::new(MemoryProfiles::default()),
        Arc::new(MemorySnapshots::default()),
        Arc::new(TracingNotifier),
        EnginePolicy::default(),
        user,
    );
    service.load().await.expect("load succeeds");

    assert_eq!(
        service.draft().personal_info.date_of_birth,
        NaiveDate::from_ymd_opt(2003, 7, 2)
    );
}
