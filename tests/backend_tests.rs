#![cfg(feature = "http")]

use cobranza::approval::*;
use cobranza::backend::*;
use cobranza::core::*;
use cobranza::notify::{Notification, NotificationKind, Notifier};
use cobranza::special::*;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> BackendClient {
    let mut settings = BackendSettings::new(server.uri());
    settings.api_token = Some("secreto".into());
    BackendClient::new(settings).unwrap()
}

fn store(server: &MockServer) -> RestConfigurationStore {
    let mut settings = BackendSettings::new("http://unused.invalid");
    settings.rest_url = Some(format!("{}/rest/v1", server.uri()));
    settings.rest_api_key = Some("anon-key".into());
    RestConfigurationStore::new(&settings).unwrap()
}

fn row(id: i64, rate: f64) -> serde_json::Value {
    json!({
        "id": id,
        "propiedad_id": 10,
        "cliente_id": 20,
        "servicio_id": 1,
        "tasa_base_especial": rate,
        "aplica_iva": true,
        "porcentaje_iva": 0.15,
        "observaciones": null,
        "solo_factura_actual": false,
        "activo": true,
        "created_at": "2026-03-01T10:00:00Z",
        "updated_at": "2026-03-01T10:00:00Z"
    })
}

#[tokio::test]
async fn recalculation_posts_payload_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/facturas/recalcular"))
        .and(header("authorization", "Bearer secreto"))
        .and(body_json(json!({
            "facturaId": 42,
            "tasa_base_especial": 3.5,
            "aplica_iva": true,
            "porcentaje_iva": 0.15,
            "area_propiedad": 200.0,
            "solo_factura_actual": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let charge = compute(dec!(3.5), dec!(200), dec!(0.15)).unwrap();
    let request = RecalculationRequest::from_charge(42, Some(dec!(3.5)), &charge, false);
    client(&server).recalculate(&request).await.unwrap();
}

#[tokio::test]
async fn recalculation_rejection_is_a_persistence_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/facturas/recalcular"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "La factura ya fue aprobada"})),
        )
        .mount(&server)
        .await;

    let charge = compute(dec!(5), dec!(1), dec!(0)).unwrap();
    let request = RecalculationRequest::from_charge(9, None, &charge, true);
    let err = client(&server).recalculate(&request).await.unwrap_err();

    let CobranzaError::Persistence(message) = err else {
        panic!("expected persistence error, got {err:?}");
    };
    assert!(message.contains("La factura ya fue aprobada"));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let client = BackendClient::new(BackendSettings::new("http://127.0.0.1:1")).unwrap();
    let charge = compute(dec!(5), dec!(1), dec!(0)).unwrap();
    let request = RecalculationRequest::from_charge(9, None, &charge, true);

    let err = client.recalculate(&request).await.unwrap_err();
    assert!(matches!(err, CobranzaError::Network(_)));
}

#[tokio::test]
async fn approval_run_against_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/facturas/aprobar"))
        .and(body_json(json!({
            "facturaIds": [1, 2, 3],
            "prefijoSecuencia": "001-001-",
            "numeroSecuenciaInicial": 50
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "aprobadas": 2,
            "errores": 1,
            "erroresDetalle": [{"facturaId": 2, "error": "Error 409: \"Documento ya existe\""}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/facturas/aprobar"))
        .and(body_json(json!({
            "facturaIds": [2],
            "prefijoSecuencia": "001-001-",
            "numeroSecuenciaInicial": 52
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "aprobadas": 1,
            "errores": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sequence = SequenceCounter::starting_at("001-001-", 50).unwrap();
    let report = approve_invoices(&client(&server), &[1, 2, 3], Some(sequence)).await;

    assert_eq!(report.approved, 3);
    assert_eq!(report.errors, 0);
    assert_eq!(report.retried, 1);
    assert_eq!(report.next_sequence.unwrap().next_raw(), 53);
}

#[tokio::test]
async fn approval_error_status_with_body_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/facturas/aprobar"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Sesión expirada"
        })))
        .mount(&server)
        .await;

    let request = ApprovalRequest {
        invoice_ids: vec![1],
        sequence_prefix: None,
        sequence_start: None,
    };
    let response = client(&server).submit(&request).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.message.as_deref(), Some("Sesión expirada"));
}

#[tokio::test]
async fn approval_error_status_without_body_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/facturas/aprobar"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let request = ApprovalRequest {
        invoice_ids: vec![1],
        sequence_prefix: None,
        sequence_start: None,
    };
    let err = client(&server).submit(&request).await.unwrap_err();
    assert!(matches!(err, CobranzaError::Network(_)));
}

#[tokio::test]
async fn notification_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notificaciones"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let notification = Notification {
        kind: NotificationKind::ConfigurationSaved,
        title: "Configuración guardada".into(),
        message: "Torre B-101".into(),
        references: vec![1],
    };
    let err = client(&server).notify(&notification).await.unwrap_err();
    assert!(matches!(err, CobranzaError::Notification(_)));
}

#[tokio::test]
async fn rest_store_finds_active_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/configuraciones_facturacion"))
        .and(query_param("propiedad_id", "eq.10"))
        .and(query_param("cliente_id", "eq.20"))
        .and(query_param("servicio_id", "eq.1"))
        .and(query_param("activo", "eq.true"))
        .and(header("apikey", "anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(5, 3.5)])))
        .expect(1)
        .mount(&server)
        .await;

    let found = store(&server)
        .find_active(&ConfigurationKey::new(10, 20, 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, 5);
    assert_eq!(found.fields.special_base_rate, Some(dec!(3.5)));
    assert_eq!(found.fields.special_tax_percentage, Some(dec!(0.15)));
}

#[tokio::test]
async fn rest_store_empty_result_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/configuraciones_facturacion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let found = store(&server)
        .find_active(&ConfigurationKey::new(10, 20, 1))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn rest_store_insert_and_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/configuraciones_facturacion"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row(6, 3.5)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/configuraciones_facturacion"))
        .and(query_param("id", "eq.6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row(6, 4.0)])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(&server);
    let key = ConfigurationKey::new(10, 20, 1);
    let fields = ConfigurationFields {
        special_base_rate: Some(dec!(3.5)),
        applies_tax: Some(true),
        special_tax_percentage: Some(dec!(0.15)),
        notes: None,
    };
    let inserted = store.insert(&key, &fields).await.unwrap();
    assert_eq!(inserted.id, 6);

    let updated = store.update(6, &fields).await.unwrap();
    assert_eq!(updated.fields.special_base_rate, Some(dec!(4)));
}

#[tokio::test]
async fn rest_store_write_failure_is_a_persistence_error() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/configuraciones_facturacion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = store(&server).deactivate(404).await.unwrap_err();
    assert!(matches!(err, CobranzaError::Persistence(_)));
}
