//! REST client behaviour against a mock server

use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;
use umbrella_core::models::{Session, User};
use umbrella_core::{
    ApiClient, AppConfig, Backend, FetchOutcome, PlanningService, ServiceRegistry, SessionStore,
};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        api_base_url: format!("{}/api", server.base_url()),
        timeout_secs: 5,
    }
}

fn user() -> User {
    User {
        id: 1,
        matricule: Some("ADM-1".to_string()),
        first_name: "Awa".to_string(),
        last_name: "Ngo".to_string(),
        email: None,
        phone: None,
        location: None,
        roles: vec!["admin".to_string()],
        is_locked: false,
        created_at: None,
    }
}

async fn signed_in_session() -> Arc<SessionStore> {
    let session = Arc::new(SessionStore::in_memory());
    session
        .set(Session {
            token: "tok-123".to_string(),
            user: user(),
        })
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn test_bearer_token_is_sent_and_envelope_unwrapped() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/plannings")
            .header("authorization", "Bearer tok-123")
            .header("user-agent", format!("umbrella/{}", umbrella_core::VERSION));
        then.status(200).json_body(json!({
            "data": [
                { "id": 1, "site_id": 3, "date": "2026-10-18",
                  "shifts": { "MORNING": { "agents": [ { "agent_id": 4 } ] } } }
            ]
        }));
    });

    let client = ApiClient::new(&config_for(&server), signed_in_session().await).unwrap();
    let service = PlanningService::new(Arc::new(client));

    assert_eq!(service.fetch_all().await.unwrap(), FetchOutcome::Loaded(1));
    mock.assert();
    let plannings = service.items().await;
    assert_eq!(plannings[0].id, 1);
    assert_eq!(plannings[0].shifts.morning.agents[0].agent_id, 4);
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/agents");
        then.status(401).json_body(json!({ "message": "Unauthenticated." }));
    });

    let session = signed_in_session().await;
    let registry = ServiceRegistry::connect(&config_for(&server), session.clone()).unwrap();

    let err = registry.agents.fetch_all().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn test_server_message_is_surfaced_on_create() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/plannings")
            .json_body(json!({
                "site_id": 3,
                "date": "2026-10-18",
                "shifts": {
                    "MORNING": { "agents": [ { "agent_id": 1, "status": "WORKED" } ] },
                    "EVENING": { "agents": [] }
                },
                "created_by": 1
            }));
        then.status(422)
            .json_body(json!({ "message": "Un planning existe déjà pour ce site et cette date" }));
    });

    let client = ApiClient::new(&config_for(&server), signed_in_session().await).unwrap();
    let service = PlanningService::new(Arc::new(client));

    let payload = umbrella_core::CreatePlanning {
        site_id: 3,
        date: chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        shifts: umbrella_core::ShiftsInput {
            morning: umbrella_core::models::ShiftInput {
                agents: vec![umbrella_core::PlanningAgentInput::worked(1)],
            },
            evening: Default::default(),
        },
        created_by: 1,
    };

    let err = service.create(&payload).await.unwrap_err();
    mock.assert();
    assert_eq!(
        err.user_message(),
        "Un planning existe déjà pour ce site et cette date"
    );
    assert!(service.is_empty().await);
}

#[tokio::test]
async fn test_generic_message_when_server_is_silent() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/api/sites/9");
        then.status(500).body("<html>Server Error</html>");
    });

    let registry =
        ServiceRegistry::connect(&config_for(&server), signed_in_session().await).unwrap();
    let err = registry.sites.delete(9).await.unwrap_err();
    assert_eq!(err.user_message(), "Erreur lors de la suppression du site");
}

#[tokio::test]
async fn test_empty_body_decodes_as_null() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/api/agents/2");
        then.status(204);
    });

    let client = ApiClient::new(&config_for(&server), signed_in_session().await).unwrap();
    let body = client.delete("/agents/2").await.unwrap();
    assert!(body.is_null());
}

#[tokio::test]
async fn test_agent_update_uses_patch() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/agents/2")
            .json_body(json!({ "phone": "690112233" }));
        then.status(200).json_body(json!({
            "id": 2,
            "matricule": "UMB-002",
            "first_name": "Paul",
            "last_name": "Mbarga",
            "phone": "690112233",
            "site": { "id": 1, "name": "Akwa" },
            "created_at": "2025-02-01T07:00:00Z"
        }));
    });

    let registry =
        ServiceRegistry::connect(&config_for(&server), signed_in_session().await).unwrap();
    let patch = umbrella_core::UpdateAgent {
        phone: Some("690112233".to_string()),
        ..Default::default()
    };
    let agent = registry.agents.update(2, &patch).await.unwrap();
    mock.assert();
    assert_eq!(agent.site.name, "Akwa");
}

#[tokio::test]
async fn test_login_and_logout_round() {
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method(POST)
            .path("/api/auth/login")
            .json_body(json!({ "matricule": "ADM-1", "password": "secret" }));
        then.status(200).json_body(json!({
            "token": "fresh-token",
            "user": { "id": 1, "first_name": "Awa", "last_name": "Ngo", "roles": "admin" }
        }));
    });
    let logout = server.mock(|when, then| {
        when.method(POST)
            .path("/api/users/logout")
            .header("authorization", "Bearer fresh-token");
        then.status(200).json_body(json!({ "message": "ok" }));
    });

    let session = Arc::new(SessionStore::in_memory());
    let registry = ServiceRegistry::connect(&config_for(&server), session.clone()).unwrap();

    let user = registry.auth.login("ADM-1", "secret").await.unwrap();
    login.assert();
    assert!(user.has_role("admin"));
    assert_eq!(session.token().await.as_deref(), Some("fresh-token"));

    registry.logout().await.unwrap();
    logout.assert();
    assert!(!session.is_authenticated().await);
}
