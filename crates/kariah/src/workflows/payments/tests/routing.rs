use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::session::{ADMIN_TENANTS_HEADER, USER_HEADER};
use crate::workflows::payments::ProviderType;

fn admin_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(USER_HEADER, "admin1")
        .header(ADMIN_TENANTS_HEADER, "mosqueA")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request")
}

#[tokio::test]
async fn activate_route_returns_masked_config() {
    let (service, _, _) = build_service(RecordingGateway::accepting());
    let router = router_with_service(service);

    let response = router
        .oneshot(admin_post(
            "/api/admin/payment-providers",
            json!({
                "tenant_id": "mosqueA",
                "provider": "billplz",
                "credentials": billplz_credentials(),
                "is_sandbox": true
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["provider"], "billplz");
    assert_eq!(payload["is_active"], true);
    assert_eq!(payload["credentials"]["apiKey"], "****0f81");
}

#[tokio::test]
async fn incomplete_credentials_are_unprocessable() {
    let (service, _, gateway) = build_service(RecordingGateway::accepting());
    let router = router_with_service(service);

    let response = router
        .oneshot(admin_post(
            "/api/admin/payment-providers",
            json!({
                "tenant_id": "mosqueA",
                "provider": "toyyibpay",
                "credentials": { "secretKey": "", "categoryCode": "X" },
                "is_sandbox": true
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error text")
        .contains("secretKey"));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn gateway_rejection_is_bad_gateway() {
    let (service, _, _) = build_service(RecordingGateway::rejecting("Invalid secret key"));
    let router = router_with_service(service);

    let response = router
        .oneshot(admin_post(
            "/api/admin/payment-providers/test",
            json!({
                "tenant_id": "mosqueA",
                "provider": "toyyibpay",
                "credentials": toyyibpay_credentials()
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error text")
        .contains("Invalid secret key"));
}

#[tokio::test]
async fn provider_routes_require_tenant_admin() {
    let (service, _, _) = build_service(RecordingGateway::accepting());
    let router = router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/admin/payment-providers?tenant_id=mosqueA")
                .header(USER_HEADER, "user1")
                .header(ADMIN_TENANTS_HEADER, "mosqueB")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deactivate_route_switches_provider_off() {
    let (service, configs, _) = build_service(RecordingGateway::accepting());
    service
        .validate_and_activate(tenant(), ProviderType::Billplz, &billplz_credentials(), false)
        .await
        .expect("active");
    let router = router_with_service(service);

    let response = router
        .clone()
        .oneshot(admin_post(
            "/api/admin/payment-providers/deactivate",
            json!({ "tenant_id": "mosqueA", "provider": "billplz" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(configs.active_providers(&tenant()).is_empty());

    let response = router
        .oneshot(
            Request::get("/api/admin/payment-providers?tenant_id=mosqueA")
                .header(USER_HEADER, "admin1")
                .header(ADMIN_TENANTS_HEADER, "mosqueA")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["is_active"], false);
}
