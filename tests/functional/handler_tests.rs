//! HTTP handler tests: decoded review in, serialized review out.

use std::sync::Arc;

use admission_webhook::HealthState;
use admission_webhook::webhooks::{
    AdmissionReview, AdmissionReviewResponse, Dispatcher, WebhookState, validate,
};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::fixtures::{
    ContainerBuilder, admission_review, compliant_container, minimal_review, pod, pod_kind,
    statefulset, statefulset_kind,
};

async fn call(state: Arc<WebhookState>, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let review: AdmissionReview = serde_json::from_value(body).unwrap();
    let response = validate(State(state), Ok(Json(review))).await;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn state() -> Arc<WebhookState> {
    Arc::new(WebhookState::new(Dispatcher::default(), None))
}

#[tokio::test]
async fn test_v1_review_echoes_type_metadata() {
    let body = admission_review(
        "h-1",
        &statefulset_kind(),
        statefulset("web", vec![compliant_container("app")]),
    );
    let (status, response) = call(state(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response,
        json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "response": {"allowed": true, "uid": "h-1"}
        })
    );
}

#[tokio::test]
async fn test_minimal_review_response_shape() {
    let body = minimal_review(
        "h-2",
        &pod_kind(),
        pod("p", vec![ContainerBuilder::new("app").image("nginx:1.25").build()]),
    );
    let (status, response) = call(state(), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response,
        json!({
            "response": {
                "allowed": false,
                "uid": "h-2",
                "status": {
                    "code": 400,
                    "message": "Container app does not have resource requirements set"
                }
            }
        })
    );
}

#[tokio::test]
async fn test_response_decodes_into_typed_review() {
    let body = minimal_review("h-3", &pod_kind(), json!({}));
    let (_, response) = call(state(), body).await;
    let typed: AdmissionReviewResponse = serde_json::from_value(response).unwrap();
    assert!(!typed.response.allowed);
    assert_eq!(typed.response.uid, "h-3");
    assert!(typed.api_version.is_none());
}

#[tokio::test]
async fn test_concurrent_requests_do_not_interfere() {
    let state = state();
    let mut handles = Vec::new();
    for i in 0..32 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            let container = if i % 2 == 0 {
                compliant_container("app")
            } else {
                ContainerBuilder::new("app").image("nginx").build()
            };
            let uid = format!("c-{}", i);
            let (_, response) =
                call(state, minimal_review(&uid, &pod_kind(), pod("p", vec![container]))).await;
            (i, uid, response)
        }));
    }

    for handle in handles {
        let (i, uid, response) = handle.await.unwrap();
        assert_eq!(response["response"]["uid"], json!(uid));
        assert_eq!(response["response"]["allowed"], json!(i % 2 == 0));
    }
}

#[tokio::test]
async fn test_metrics_recorded_per_kind() {
    let health = Arc::new(HealthState::new());
    let state = Arc::new(WebhookState::new(Dispatcher::default(), Some(health.clone())));

    call(
        state.clone(),
        minimal_review("m-1", &statefulset_kind(), statefulset("s", vec![compliant_container("a")])),
    )
    .await;
    call(
        state,
        minimal_review(
            "m-2",
            &admission_webhook::KindIdentity::core("v1", "ConfigMap"),
            json!({"data": {}}),
        ),
    )
    .await;

    let encoded = health.metrics.encode();
    assert!(encoded.contains(r#"admission_requests_total{kind="apps/v1/StatefulSet",allowed="true"} 1"#));
    assert!(encoded.contains(r#"admission_requests_total{kind="unregistered",allowed="true"} 1"#));
}
