//! End-to-end tests for the gateway: forwarding, route misses, rate
//! limiting, and the permissive authentication filter.

use std::net::SocketAddr;
use std::time::Duration;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use edge_gateway::auth::TokenVerifier;
use edge_gateway::config::{GatewayConfig, RouteConfig};
use edge_gateway::lifecycle::Shutdown;
use edge_gateway::GatewayServer;

mod common;

const SECRET: &str = "integration-test-secret-integration-test-secret";

fn base_config(routes: Vec<RouteConfig>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.signing_secret = SECRET.into();
    config.routes = routes;
    config
}

fn route(name: &str, pattern: &str, upstream: &SocketAddr) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        path_pattern: pattern.into(),
        upstream: format!("http://{upstream}"),
    }
}

async fn spawn_gateway(config: GatewayConfig, addr: SocketAddr) -> Shutdown {
    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config).expect("config should be valid");
    let listener = TcpListener::bind(addr).await.unwrap();
    let (_updates_tx, config_updates) = mpsc::unbounded_channel();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, rx).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn forwards_to_matching_upstream() {
    let backend_addr: SocketAddr = "127.0.0.1:36101".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36102".parse().unwrap();
    common::start_echo_backend(backend_addr).await;

    let config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let res = client()
        .get(format!("http://{gateway_addr}/api/alerts/123"))
        .send()
        .await
        .expect("gateway unreachable");

    assert_eq!(res.status(), 200);
    assert!(
        res.headers().contains_key("x-request-id"),
        "gateway should stamp a request id"
    );
    assert!(
        res.headers().contains_key("x-echo-gateway-timestamp"),
        "upstream should have seen the gateway timestamp"
    );
    assert_eq!(res.text().await.unwrap(), "GET /api/alerts/123");

    shutdown.trigger();
}

#[tokio::test]
async fn unmatched_path_returns_404() {
    let backend_addr: SocketAddr = "127.0.0.1:36111".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36112".parse().unwrap();
    common::start_echo_backend(backend_addr).await;

    let config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let res = client()
        .get(format!("http://{gateway_addr}/api/users/1"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);

    shutdown.trigger();
}

#[tokio::test]
async fn rate_limit_rejects_with_retry_after() {
    let backend_addr: SocketAddr = "127.0.0.1:36121".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36122".parse().unwrap();
    common::start_echo_backend(backend_addr).await;

    let mut config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    config.rate_limit.requests_per_window = 3;
    config.rate_limit.window_secs = 60;
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let client = client();
    for _ in 0..3 {
        let res = client
            .get(format!("http://{gateway_addr}/api/alerts/1"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }

    let res = client
        .get(format!("http://{gateway_addr}/api/alerts/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429);
    let retry_after: u64 = res
        .headers()
        .get("retry-after")
        .expect("429 must carry Retry-After")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    // The logging filter wraps short-circuits too: the request id is
    // stamped even on a rejection.
    assert!(res.headers().contains_key("x-request-id"));

    shutdown.trigger();
}

#[tokio::test]
async fn authenticated_and_anonymous_limited_independently() {
    let backend_addr: SocketAddr = "127.0.0.1:36131".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36132".parse().unwrap();
    common::start_echo_backend(backend_addr).await;

    let mut config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    config.rate_limit.requests_per_window = 2;
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let client = client();
    for _ in 0..2 {
        let res = client
            .get(format!("http://{gateway_addr}/api/alerts/1"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }
    let res = client
        .get(format!("http://{gateway_addr}/api/alerts/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 429, "anonymous budget exhausted");

    // Same peer address, but authenticated traffic has its own window.
    let verifier = TokenVerifier::new(SECRET, Algorithm::HS512, Duration::from_secs(3600));
    let token = verifier.issue("alice", vec!["ANALYST".into()]).unwrap();
    let res = client
        .get(format!("http://{gateway_addr}/api/alerts/1"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn verified_identity_is_forwarded_upstream() {
    let backend_addr: SocketAddr = "127.0.0.1:36141".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36142".parse().unwrap();
    common::start_echo_backend(backend_addr).await;

    let config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let verifier = TokenVerifier::new(SECRET, Algorithm::HS512, Duration::from_secs(3600));
    let token = verifier
        .issue("alice", vec!["ANALYST".into(), "ADMIN".into()])
        .unwrap();

    let res = client()
        .get(format!("http://{gateway_addr}/api/alerts/1"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("x-echo-auth-subject").unwrap(),
        "alice"
    );
    assert_eq!(
        res.headers().get("x-echo-auth-roles").unwrap(),
        "ANALYST,ADMIN"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn expired_token_is_forwarded_anonymously() {
    let backend_addr: SocketAddr = "127.0.0.1:36151".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36152".parse().unwrap();
    common::start_echo_backend(backend_addr).await;

    let config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    let shutdown = spawn_gateway(config, gateway_addr).await;

    #[derive(Serialize)]
    struct StaleClaims {
        sub: String,
        roles: Vec<String>,
        iat: i64,
        exp: i64,
    }
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    // Correctly signed but an hour past expiry: the gateway must not
    // reject it, only drop the identity.
    let token = encode(
        &Header::new(Algorithm::HS512),
        &StaleClaims {
            sub: "alice".into(),
            roles: vec!["ADMIN".into()],
            iat: now - 7200,
            exp: now - 3600,
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let res = client()
        .get(format!("http://{gateway_addr}/api/alerts/1"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200, "auth filter never rejects by itself");
    assert!(
        res.headers().get("x-echo-auth-subject").is_none(),
        "expired token must not produce an identity"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn spoofed_identity_headers_are_stripped() {
    let backend_addr: SocketAddr = "127.0.0.1:36161".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36162".parse().unwrap();
    common::start_echo_backend(backend_addr).await;

    let config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let res = client()
        .get(format!("http://{gateway_addr}/api/alerts/1"))
        .header("X-Auth-Subject", "admin")
        .header("X-Auth-Roles", "ADMIN")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.headers().get("x-echo-auth-subject").is_none());
    assert!(res.headers().get("x-echo-auth-roles").is_none());

    shutdown.trigger();
}

#[test]
fn refuses_to_start_without_signing_secret() {
    let dead_addr: SocketAddr = "127.0.0.1:36181".parse().unwrap();
    let mut config = base_config(vec![route("alerts", "/api/alerts/**", &dead_addr)]);
    config.auth.signing_secret = String::new();
    assert!(GatewayServer::new(config).is_err());
}

#[test]
fn refuses_to_start_with_empty_route_table() {
    let config = base_config(vec![]);
    assert!(GatewayServer::new(config).is_err());
}

#[tokio::test]
async fn unreachable_upstream_returns_502() {
    let gateway_addr: SocketAddr = "127.0.0.1:36172".parse().unwrap();
    // Nothing listens on this port.
    let dead_addr: SocketAddr = "127.0.0.1:36171".parse().unwrap();

    let config = base_config(vec![route("alerts", "/api/alerts/**", &dead_addr)]);
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let res = client()
        .get(format!("http://{gateway_addr}/api/alerts/1"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);

    shutdown.trigger();
}

#[tokio::test]
async fn stalled_upstream_returns_503() {
    let backend_addr: SocketAddr = "127.0.0.1:36201".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36202".parse().unwrap();
    common::start_blackhole_backend(backend_addr).await;

    let mut config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    config.timeouts.upstream_secs = 1;
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let res = client()
        .get(format!("http://{gateway_addr}/api/alerts/1"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 503, "a hung upstream maps to 503, not 502");

    shutdown.trigger();
}

#[tokio::test]
async fn request_timeout_still_logs_completion() {
    let backend_addr: SocketAddr = "127.0.0.1:36191".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36192".parse().unwrap();
    common::start_blackhole_backend(backend_addr).await;

    let mut config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    // Request deadline fires before the upstream one.
    config.timeouts.request_secs = 1;
    config.timeouts.upstream_secs = 30;
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let res = client()
        .get(format!("http://{gateway_addr}/api/alerts/1"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 408);
    // The timeout fires inside the logging filter, so the timed-out
    // response still passes back through it and picks up the request id.
    assert!(
        res.headers().contains_key("x-request-id"),
        "a timed-out request must still travel through the logging filter"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn cors_preflight_is_answered_at_the_edge() {
    let backend_addr: SocketAddr = "127.0.0.1:36211".parse().unwrap();
    let gateway_addr: SocketAddr = "127.0.0.1:36212".parse().unwrap();
    common::start_echo_backend(backend_addr).await;

    let config = base_config(vec![route("alerts", "/api/alerts/**", &backend_addr)]);
    let shutdown = spawn_gateway(config, gateway_addr).await;

    let res = client()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://{gateway_addr}/api/alerts/1"),
        )
        .header("Origin", "http://web.example")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("access-control-allow-origin").unwrap(),
        "http://web.example"
    );
    assert_eq!(
        res.headers()
            .get("access-control-allow-credentials")
            .unwrap(),
        "true"
    );
    // The preflight never reached the upstream.
    assert!(res.headers().get("x-echo-gateway-timestamp").is_none());

    shutdown.trigger();
}
