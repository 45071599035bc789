//! HTTP adapter
//!
//! A fixed route table maps `(method, path)` to an operation and to the
//! status codes used for its success and failure results. Requests that match
//! no route never reach the dispatcher.

use crate::command::CommandDispatcher;
use anyhow::{Context as _, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use iris_shared::OperationId;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// One entry of the route table
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub method: &'static str,
    pub path: &'static str,
    pub op: OperationId,
    pub ok: StatusCode,
    pub fail: StatusCode,
}

const fn route(method: &'static str, path: &'static str, op: OperationId) -> Route {
    Route {
        method,
        path,
        op,
        ok: StatusCode::OK,
        fail: StatusCode::BAD_REQUEST,
    }
}

pub const ROUTES: &[Route] = &[
    route("PATCH", "/api/update/wifi/", OperationId::UpdateWifi),
    route("PATCH", "/api/update/device/mode/", OperationId::SwitchMode),
    route("PATCH", "/api/update/camera/", OperationId::UpdateCamera),
    route("PATCH", "/api/update/ota/credentials", OperationId::UpdateOtaCredentials),
    route("PATCH", "/api/update/ap/", OperationId::UpdateApWifi),
    route("PATCH", "/api/update/led_duty_cycle/", OperationId::SetLedDutyCycle),
    route("PATCH", "/api/update/fan_duty_cycle/", OperationId::SetFanDutyCycle),
    route("POST", "/api/set/pause/", OperationId::Pause),
    route("POST", "/api/set/wifi/", OperationId::SetWifi),
    route("POST", "/api/set/mdns/", OperationId::SetMdns),
    route("POST", "/api/set/config/save/", OperationId::SaveConfig),
    route("POST", "/api/set/wifi/connect/", OperationId::ConnectWifi),
    route("POST", "/api/reset/config/", OperationId::ResetConfig),
    route("GET", "/api/get/config/", OperationId::GetConfig),
    route("GET", "/api/get/mdns/", OperationId::GetMdnsName),
    route("GET", "/api/get/led_duty_cycle/", OperationId::GetLedDutyCycle),
    route("GET", "/api/get/fan_duty_cycle/", OperationId::GetFanDutyCycle),
    route("GET", "/api/get/serial_number/", OperationId::GetSerial),
    route("GET", "/api/get/led_current/", OperationId::GetLedCurrent),
    route("GET", "/api/get/battery_status/", OperationId::GetBatteryStatus),
    route("GET", "/api/get/who_am_i/", OperationId::GetWhoAmI),
    route("GET", "/api/get/device/mode/", OperationId::GetDeviceMode),
    route("GET", "/api/get/wifi/status/", OperationId::GetWifiStatus),
    route("GET", "/api/get/wifi/scan/", OperationId::ScanNetworks),
    route("DELETE", "/api/delete/wifi", OperationId::DeleteNetwork),
    Route {
        method: "GET",
        path: "/api/reboot/device/",
        op: OperationId::RestartDevice,
        ok: StatusCode::OK,
        fail: StatusCode::INTERNAL_SERVER_ERROR,
    },
    route("GET", "/api/ping/", OperationId::Ping),
];

/// Why a request matched no route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
}

/// Find the route for `method` and `path`
pub fn resolve(method: &Method, path: &str) -> Result<&'static Route, RouteError> {
    let mut candidates = ROUTES.iter().filter(|route| route.path == path).peekable();
    if candidates.peek().is_none() {
        return Err(RouteError::NotFound);
    }
    candidates
        .find(|route| route.method == method.as_str())
        .ok_or(RouteError::MethodNotAllowed)
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn handle_request(
    State(dispatcher): State<Arc<CommandDispatcher>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let route = match resolve(&method, uri.path()) {
        Ok(route) => route,
        Err(RouteError::NotFound) => {
            debug!("[HTTP] no route for {}", uri.path());
            return (StatusCode::NOT_FOUND, "Wrong URL").into_response();
        }
        Err(RouteError::MethodNotAllowed) => {
            debug!("[HTTP] {} not allowed on {}", method, uri.path());
            let body = br#"{"error":"Method not allowed"}"#.to_vec();
            return json_response(StatusCode::UNAUTHORIZED, body);
        }
    };

    let envelope = dispatcher.execute_by_type(route.op, &body).await;
    let status = if envelope.is_success() { route.ok } else { route.fail };

    match envelope.to_vec() {
        Ok(body) => json_response(status, body),
        Err(e) => {
            error!("[HTTP] failed to encode response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Router dispatching every request through the route table
pub fn router(dispatcher: Arc<CommandDispatcher>) -> Router {
    Router::new().fallback(handle_request).with_state(dispatcher)
}

/// Bind `address` and serve the route table until the server fails
pub async fn run_http(address: &str, dispatcher: Arc<CommandDispatcher>) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind HTTP server on {address}"))?;

    info!("[HTTP] listening on {}", listener.local_addr()?);

    axum::serve(listener, router(dispatcher))
        .await
        .context("HTTP server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::handlers::testing::{empty, rig};
    use crate::subsystems::DeviceConfigStore;
    use crate::transport::line::tests::exchange;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use tower::ServiceExt;

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, body.to_vec())
    }

    #[test]
    fn test_route_table_has_no_duplicates() {
        let mut seen = HashSet::new();
        for route in ROUTES {
            assert!(seen.insert((route.method, route.path)), "{} {}", route.method, route.path);
        }
    }

    #[test]
    fn test_resolve() {
        let route = resolve(&Method::GET, "/api/ping/").unwrap();
        assert_eq!(route.op, OperationId::Ping);

        assert_eq!(resolve(&Method::POST, "/api/ping/").unwrap_err(), RouteError::MethodNotAllowed);
        assert_eq!(resolve(&Method::GET, "/api/ping").unwrap_err(), RouteError::NotFound);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let rig = rig();
        let app = router(Arc::new(CommandDispatcher::new(rig.ctx.clone())));
        let (status, _, body) = send(app, "GET", "/api/self_destruct/", "").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Wrong URL");
    }

    #[tokio::test]
    async fn test_wrong_method_never_dispatches() {
        let rig = rig();
        let app = router(Arc::new(CommandDispatcher::new(rig.ctx.clone())));
        let (status, _, body) = send(app, "GET", "/api/update/led_duty_cycle/", r#"{"dutyCycle":40}"#).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"error": "Method not allowed"}));
        assert_eq!(rig.led.writes(), 0);
    }

    #[tokio::test]
    async fn test_status_code_follows_result() {
        let rig = rig();
        let app = router(Arc::new(CommandDispatcher::new(rig.ctx.clone())));

        let (status, content_type, body) =
            send(app.clone(), "PATCH", "/api/update/led_duty_cycle/", r#"{"dutyCycle":40}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["result"]["status"], "success");
        assert_eq!(rig.store.snapshot().await.led_external_pwm_duty_cycle, 40);

        let (status, _, body) =
            send(app, "PATCH", "/api/update/led_duty_cycle/", r#"{"dutyCycle":150}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["result"]["message"], "dutyCycle out of range");
    }

    #[tokio::test]
    async fn test_reboot_failure_code() {
        let app = router(Arc::new(CommandDispatcher::new(empty())));
        let (status, _, body) = send(app, "GET", "/api/reboot/device/", "").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["result"]["message"], "system control unavailable");
    }

    #[tokio::test]
    async fn test_http_and_line_transports_agree() {
        let rig = rig();
        let app = router(Arc::new(CommandDispatcher::new(rig.ctx.clone())));
        let (_, _, http_body) = send(app, "POST", "/api/set/wifi/", r#"{"name":"lab","ssid":"iris"}"#).await;

        let line = br#"{"command":"set_wifi","data":{"name":"lab","ssid":"iris"}}"#;
        let mut input = line.to_vec();
        input.push(b'\n');
        let envelopes = exchange(&input).await;

        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].to_vec().unwrap(), http_body);
    }

    #[tokio::test]
    async fn test_mode_switch_bytes_match_line_transport() {
        let rig = rig();
        let app = router(Arc::new(CommandDispatcher::new(rig.ctx.clone())));
        let (_, _, http_body) = send(app, "PATCH", "/api/update/device/mode/", r#"{"mode":"uvc"}"#).await;

        let envelopes = exchange(b"{\"command\":\"switch_mode\",\"data\":{\"mode\":\"uvc\"}}\n").await;
        assert_eq!(envelopes[0].to_vec().unwrap(), http_body);
    }
}
