// tests/db_tests.rs
//
// Fluxos completos contra um Postgres real (TEST_DATABASE_URL).

use axum::http::{Method, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

mod common;
use common::{create_lead, create_member, id_of, register_clinic, send, test_app};

fn as_datetime(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(|s| s.parse().ok())
}

// ---
// Consulta → Lead
// ---

#[tokio::test]
async fn consulta_with_next_appointment_updates_the_lead() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (dentist_id, _) = create_member(&app, &clinic, "DENTIST", Some(clinic.sede_id)).await;
    let lead_id = create_lead(&app, &clinic.admin_token, json!({})).await;

    let (status, consulta) = send(
        &app,
        Method::POST,
        "/api/consultas",
        Some(&clinic.admin_token),
        Some(json!({
            "leadId": lead_id,
            "dentistaId": dentist_id,
            "dataConsulta": "2025-04-10T09:00:00-03:00",
            "duracao": 30,
            "procedimentos": ["limpeza"],
            "proximaConsulta": "2025-04-24T09:00:00-03:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", consulta);

    let (_, lead) = send(&app, Method::GET, &format!("/api/leads/{}", lead_id), Some(&clinic.admin_token), None).await;
    assert_eq!(as_datetime(&lead["dataConsulta"]), Some(Utc.with_ymd_and_hms(2025, 4, 24, 12, 0, 0).unwrap()));
    assert_eq!(lead["duracaoConsulta"], 30);

    // null explícito limpa o espelho, já que o lead ainda aponta para esta consulta
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/consultas/{}", id_of(&consulta)),
        Some(&clinic.admin_token),
        Some(json!({ "proximaConsulta": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, lead) = send(&app, Method::GET, &format!("/api/leads/{}", lead_id), Some(&clinic.admin_token), None).await;
    assert!(lead["dataConsulta"].is_null());
    assert!(lead["duracaoConsulta"].is_null());
}

#[tokio::test]
async fn consulta_without_next_appointment_leaves_the_lead_alone() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (dentist_id, _) = create_member(&app, &clinic, "DENTIST", None).await;
    let lead_id = create_lead(
        &app,
        &clinic.admin_token,
        json!({ "dataConsulta": "2025-05-10T14:30:00Z", "duracaoConsulta": 60 }),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/consultas",
        Some(&clinic.admin_token),
        Some(json!({
            "leadId": lead_id,
            "dentistaId": dentist_id,
            "dataConsulta": "2025-04-10T09:00:00Z",
            "duracao": 45
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, lead) = send(&app, Method::GET, &format!("/api/leads/{}", lead_id), Some(&clinic.admin_token), None).await;
    assert_eq!(as_datetime(&lead["dataConsulta"]), Some(Utc.with_ymd_and_hms(2025, 5, 10, 14, 30, 0).unwrap()));
    assert_eq!(lead["duracaoConsulta"], 60);
}

#[tokio::test]
async fn consulta_for_unknown_lead_is_not_found_and_not_persisted() {
    let (app, pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (dentist_id, _) = create_member(&app, &clinic, "DENTIST", None).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/consultas",
        Some(&clinic.admin_token),
        Some(json!({
            "leadId": Uuid::new_v4(),
            "dentistaId": dentist_id,
            "dataConsulta": "2025-04-10T09:00:00Z",
            "duracao": 30,
            "proximaConsulta": "2025-04-24T09:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM consultas WHERE dentista_id = $1")
        .bind(dentist_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    // Lead desconhecido vence o dentista inválido
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/consultas",
        Some(&clinic.admin_token),
        Some(json!({
            "leadId": Uuid::new_v4(),
            "dentistaId": Uuid::new_v4(),
            "dataConsulta": "2025-04-10T09:00:00Z",
            "duracao": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_next_appointment_date_is_bad_request() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (dentist_id, _) = create_member(&app, &clinic, "DENTIST", None).await;
    let lead_id = create_lead(&app, &clinic.admin_token, json!({})).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/consultas",
        Some(&clinic.admin_token),
        Some(json!({
            "leadId": lead_id,
            "dentistaId": dentist_id,
            "dataConsulta": "2025-04-10T09:00:00Z",
            "duracao": 30,
            "proximaConsulta": "31/02/2025"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---
// Exclusão de usuários
// ---

#[tokio::test]
async fn dentist_with_consultas_is_kept() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (dentist_id, _) = create_member(&app, &clinic, "DENTIST", None).await;
    let lead_id = create_lead(&app, &clinic.admin_token, json!({})).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/consultas",
        Some(&clinic.admin_token),
        Some(json!({
            "leadId": lead_id,
            "dentistaId": dentist_id,
            "dataConsulta": "2025-04-10T09:00:00Z",
            "duracao": 30
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/auth/users/{}", dentist_id);
    let (status, body) = send(&app, Method::DELETE, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["details"]["consultasCount"], 1);

    let (status, _) = send(&app, Method::GET, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn user_responsible_for_leads_is_kept() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (worker_id, _) = create_member(&app, &clinic, "WORKER", None).await;
    create_lead(&app, &clinic.admin_token, json!({ "responsibleId": worker_id })).await;

    let uri = format!("/api/auth/users/{}", worker_id);
    let (status, body) = send(&app, Method::DELETE, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["leadsCount"], 1);

    let (status, _) = send(&app, Method::GET, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn pending_task_blocks_delete_and_completed_task_does_not() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (worker_id, _) = create_member(&app, &clinic, "WORKER", None).await;
    let lead_id = create_lead(&app, &clinic.admin_token, json!({})).await;

    let (status, task) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(&clinic.admin_token),
        Some(json!({ "leadId": lead_id, "assignedTo": worker_id, "title": "Ligar para confirmar" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", task);

    let uri = format!("/api/auth/users/{}", worker_id);
    let (status, body) = send(&app, Method::DELETE, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["tasksCount"], 1);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/tasks/{}/complete", id_of(&task)),
        Some(&clinic.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT, "{}", body);

    // A tarefa concluída continua no histórico, só sem responsável
    let (_, tasks) = send(
        &app,
        Method::GET,
        &format!("/api/tasks?leadId={}", lead_id),
        Some(&clinic.admin_token),
        None,
    )
    .await;
    assert_eq!(tasks[0]["assignedTo"], Value::Null);
}

#[tokio::test]
async fn admin_cannot_delete_itself() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/auth/users/{}", clinic.admin_id),
        Some(&clinic.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---
// Cargos
// ---

#[tokio::test]
async fn non_admin_cannot_update_or_delete_users() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (_, manager_token) = create_member(&app, &clinic, "MANAGER", None).await;
    let (worker_id, _) = create_member(&app, &clinic, "WORKER", None).await;

    let uri = format!("/api/auth/users/{}", worker_id);
    let (status, _) = send(&app, Method::PUT, &uri, Some(&manager_token), Some(json!({ "name": "Outro Nome" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&manager_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, user) = send(&app, Method::GET, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["name"], "Usuário WORKER");
}

#[tokio::test]
async fn admin_cannot_create_or_promote_super_admin() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (worker_id, _) = create_member(&app, &clinic, "WORKER", None).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/users",
        Some(&clinic.admin_token),
        Some(json!({
            "name": "Root",
            "email": common::unique_email("root"),
            "password": common::PASSWORD,
            "role": "SUPER_ADMIN"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/auth/users/{}", worker_id);
    let (status, _) = send(&app, Method::PUT, &uri, Some(&clinic.admin_token), Some(json!({ "role": "SUPER_ADMIN" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, user) = send(&app, Method::GET, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(user["role"], "WORKER");
}

// ---
// Unidades
// ---

#[tokio::test]
async fn dentist_without_unit_sees_no_units() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (_, dentist_token) = create_member(&app, &clinic, "DENTIST", None).await;

    let (status, units) = send(&app, Method::GET, "/api/units", Some(&dentist_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(units, json!([]));
}

#[tokio::test]
async fn headquarters_cannot_be_deleted() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;
    let (_, worker_token) = create_member(&app, &clinic, "WORKER", Some(clinic.sede_id)).await;

    let uri = format!("/api/units/{}", clinic.sede_id);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // SEDE vem antes da checagem de cargo
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&worker_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, unit) = send(&app, Method::GET, &uri, Some(&clinic.admin_token), None).await;
    assert_eq!(unit["active"], true);
}

#[tokio::test]
async fn leads_cannot_point_to_a_deactivated_unit() {
    let (app, _pool) = test_app().await;
    let clinic = register_clinic(&app).await;

    let (status, unit) = send(
        &app,
        Method::POST,
        "/api/units",
        Some(&clinic.admin_token),
        Some(json!({ "name": "Unidade Norte", "code": "norte" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", unit);
    let unit_id = id_of(&unit);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/units/{}", unit_id), Some(&clinic.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/leads",
        Some(&clinic.admin_token),
        Some(json!({ "name": "Paciente Norte", "phone": "11988887777", "unitId": unit_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let lead_id = create_lead(&app, &clinic.admin_token, json!({})).await;
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/leads/{}", lead_id),
        Some(&clinic.admin_token),
        Some(json!({ "unitId": unit_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
