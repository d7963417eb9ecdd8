//! Whole-system test: configuration-built service, real HTTP client against a
//! mock completion endpoint, SQLite history.

use std::sync::Arc;
use std::time::Duration;

use flyid_core::config::{AppConfig, RecordBackend};
use flyid_core::Error;
use flyid_gateway::build_service;
use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn analysis_content(confidence: f64) -> String {
    json!({
        "flyIdentification": {
            "commonName": "",
            "imitatedInsect": {
                "order": "Ephemeroptera",
                "family": "Baetidae",
                "genus": "Baetis",
                "species": null
            },
            "similarSpeciesDiscarded": [],
            "confidence": confidence
        },
        "description": "Emergente de oliva para aguas rápidas.",
        "mountingInstructions": [
            "Materiales: anzuelo del 16, CDC gris, seda oliva",
            "Paso 1: Cercos de pardo"
        ]
    })
    .to_string()
}

fn completion(content: &str) -> serde_json::Value {
    json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]})
}

fn config_for(server: &MockServer, dir: &tempfile::TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.model.base_url = format!("{}/v1", server.uri());
    config.model.api_key = Some(Secret::new("sk-test".to_string()));
    config.store.backend = RecordBackend::Sqlite;
    config.store.sqlite_path = dir.path().join("flyid.db").to_string_lossy().into_owned();
    config.server.capture_dir = dir.path().to_string_lossy().into_owned();
    config
}

#[tokio::test]
async fn test_capture_flow_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-4o", "max_completion_tokens": 600})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&analysis_content(0.85))))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("emergente.jpg");
    std::fs::write(&image_path, b"\xff\xd8\xff\xe0\x00\x10JFIF\x00").unwrap();
    let image_ref = image_path.to_string_lossy().into_owned();

    let config = config_for(&server, &dir);
    let llm = Arc::new(flyid_model_gateway::create_client_from_config(&config.model).unwrap());
    let service = build_service(&config, llm).await.unwrap();

    let result = service
        .analyze_reference(&image_ref, Some("angler-3"))
        .await
        .unwrap();
    assert_eq!(result.fly_identification.imitated_insect.species, None);

    let history = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let history = service.history(Some("angler-3"), None).await.unwrap();
            if !history.is_empty() {
                break history;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("capture was not persisted");

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].analysis(), &result);
    assert_eq!(history[0].record.search_tags, vec!["Ephemeroptera", "Baetidae"]);
    assert_eq!(history[0].record.local_image_uri, image_ref);

    // Other users see nothing
    assert!(service.history(Some("angler-4"), None).await.unwrap().is_empty());
    assert!(matches!(
        service.history(None, None).await.unwrap_err(),
        Error::Unauthorized(_)
    ));
}

#[tokio::test]
async fn test_chat_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"max_completion_tokens": 300})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Prueba una Pheasant Tail.")))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, &dir);
    let llm = Arc::new(flyid_model_gateway::create_client_from_config(&config.model).unwrap());
    let service = build_service(&config, llm).await.unwrap();

    let reply = service
        .chat(&[flyid_core::types::ChatMessage::user("¿Ninfa para el Tajo?")])
        .await
        .unwrap();
    assert_eq!(reply, "Prueba una Pheasant Tail.");
}

#[tokio::test]
async fn test_references_outside_capture_dir_never_reach_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&analysis_content(0.85))))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, &dir);
    let llm = Arc::new(flyid_model_gateway::create_client_from_config(&config.model).unwrap());
    let service = build_service(&config, llm).await.unwrap();

    for reference in ["/etc/passwd", "https://example.com/fly.jpg"] {
        let err = service
            .analyze_reference(reference, Some("angler-3"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)), "{reference}: {err:?}");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}
