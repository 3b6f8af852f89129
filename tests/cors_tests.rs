//! CORS middleware behaviour through the dispatcher
//!
//! # Test Coverage
//!
//! - Preflight acceptance and rejection
//! - Header emission on simple requests
//! - Wildcard and regex origin policies
//! - Configuration validation

use std::sync::Arc;

use http::Method;
use tollgate::dispatcher::{Dispatcher, HandlerResponse, IncomingRequest};
use tollgate::handler;
use tollgate::middleware::{
    CorsConfig, CorsConfigError, CorsMiddleware, CorsMiddlewareBuilder, Middleware,
};
use tollgate::registry::ControllerRegistry;
use tollgate::router::RouterBuilder;

mod common;
use common::CallCounter;

const APP: &str = "https://app.example.com";

fn app_cors() -> Arc<dyn Middleware> {
    Arc::new(
        CorsMiddlewareBuilder::new()
            .allowed_origins(&[APP])
            .allow_credentials(true)
            .build()
            .unwrap(),
    )
}

fn dispatcher(cors: Arc<dyn Middleware>, counter: &CallCounter) -> Dispatcher {
    let mut builder = RouterBuilder::new();
    builder.group("/api", vec![cors], |api| {
        api.preflight("/items").post("/items", counter.handler());
    });
    Dispatcher::new(builder.build(&ControllerRegistry::new()).unwrap())
}

#[test]
fn test_preflight_from_allowed_origin() {
    let counter = CallCounter::default();
    let d = dispatcher(app_cors(), &counter);

    let res = d.dispatch(IncomingRequest::new("OPTIONS", "/api/items").header("Origin", APP));
    assert_eq!(res.status, 204);
    assert_eq!(res.get_header("access-control-allow-origin"), Some(APP));
    assert_eq!(res.get_header("access-control-allow-credentials"), Some("true"));
    assert_eq!(res.get_header("access-control-max-age"), Some("86400"));
    assert!(res
        .get_header("access-control-allow-methods")
        .unwrap()
        .contains("POST"));
    assert_eq!(res.get_header("vary"), Some("Origin"));
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_preflight_from_disallowed_origin_is_403() {
    let counter = CallCounter::default();
    let d = dispatcher(app_cors(), &counter);

    let res = d.dispatch(
        IncomingRequest::new("OPTIONS", "/api/items").header("Origin", "https://evil.example"),
    );
    assert_eq!(res.status, 403);
    assert_eq!(res.body["data"]["error"], "origin_not_allowed");
    assert_eq!(res.body["data"]["origin"], "https://evil.example");
    assert!(res.get_header("access-control-allow-origin").is_none());
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_preflight_without_origin_is_403() {
    let counter = CallCounter::default();
    let d = dispatcher(app_cors(), &counter);
    let res = d.dispatch(IncomingRequest::new("OPTIONS", "/api/items"));
    assert_eq!(res.status, 403);
    assert_eq!(res.body["data"]["error"], "origin_not_allowed");
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_simple_request_gets_headers_and_reaches_handler() {
    let counter = CallCounter::default();
    let d = dispatcher(app_cors(), &counter);

    let res = d.dispatch(IncomingRequest::new("POST", "/api/items").header("Origin", APP));
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("access-control-allow-origin"), Some(APP));
    assert_eq!(
        res.get_header("access-control-expose-headers"),
        Some("Content-Length, Content-Range")
    );
    assert_eq!(counter.count(), 1);
}

#[test]
fn test_simple_request_from_other_origin_omits_allow_origin() {
    let counter = CallCounter::default();
    let d = dispatcher(app_cors(), &counter);

    let res = d.dispatch(
        IncomingRequest::new("POST", "/api/items").header("Origin", "https://other.example"),
    );
    assert_eq!(res.status, 200);
    assert!(res.get_header("access-control-allow-origin").is_none());
    assert_eq!(counter.count(), 1);
}

#[test]
fn test_permissive_policy_answers_wildcard() {
    let counter = CallCounter::default();
    let d = dispatcher(Arc::new(CorsMiddleware::permissive()), &counter);

    let res = d.dispatch(
        IncomingRequest::new("OPTIONS", "/api/items").header("Origin", "https://anything.test"),
    );
    assert_eq!(res.status, 204);
    assert_eq!(res.get_header("access-control-allow-origin"), Some("*"));
    assert!(res.get_header("access-control-allow-credentials").is_none());
}

#[test]
fn test_regex_origin_patterns() {
    let cors = CorsMiddlewareBuilder::new()
        .allowed_origin_patterns(&[r"^https://[a-z]+\.example\.com$"])
        .allowed_methods(&[Method::GET, Method::POST])
        .build()
        .unwrap();
    let counter = CallCounter::default();
    let d = dispatcher(Arc::new(cors), &counter);

    let ok = d.dispatch(
        IncomingRequest::new("OPTIONS", "/api/items").header("Origin", "https://tenant.example.com"),
    );
    assert_eq!(ok.status, 204);
    assert_eq!(
        ok.get_header("access-control-allow-origin"),
        Some("https://tenant.example.com")
    );
    assert_eq!(ok.get_header("access-control-allow-methods"), Some("GET, POST"));

    let rejected = d.dispatch(
        IncomingRequest::new("OPTIONS", "/api/items").header("Origin", "https://example.org"),
    );
    assert_eq!(rejected.status, 403);
}

#[test]
fn test_default_config_allows_local_dev_origins() {
    let cors = CorsMiddleware::from_config(&CorsConfig::default()).unwrap();
    let counter = CallCounter::default();
    let d = dispatcher(Arc::new(cors), &counter);

    for origin in [
        "http://localhost:5173",
        "http://localhost:3000",
        "http://localhost:8080",
    ] {
        let res =
            d.dispatch(IncomingRequest::new("OPTIONS", "/api/items").header("Origin", origin));
        assert_eq!(res.status, 204, "{origin}");
    }
}

#[test]
fn test_invalid_configurations_are_rejected() {
    assert_eq!(
        CorsMiddlewareBuilder::new()
            .allowed_origins(&["*"])
            .allow_credentials(true)
            .build()
            .err(),
        Some(CorsConfigError::WildcardWithCredentials)
    );
    assert_eq!(
        CorsMiddlewareBuilder::new().allow_credentials(true).build().err(),
        Some(CorsConfigError::EmptyOriginsWithCredentials)
    );
    assert!(matches!(
        CorsMiddlewareBuilder::new()
            .allowed_origins(&["example.com"])
            .build(),
        Err(CorsConfigError::InvalidOriginFormat { .. })
    ));
    assert!(matches!(
        CorsMiddlewareBuilder::new()
            .allowed_origin_patterns(&["(unclosed"])
            .build(),
        Err(CorsConfigError::InvalidOriginPattern { .. })
    ));
}

#[test]
fn test_malformed_exact_origins_are_rejected_at_build() {
    for origin in [
        "https://exa mple.com",
        "https://app.example.com/",
        "https://app.example.com?x=1",
        "https://user@app.example.com",
    ] {
        assert_eq!(
            CorsMiddlewareBuilder::new()
                .allowed_origins(&[APP, origin])
                .build()
                .err(),
            Some(CorsConfigError::InvalidOriginFormat {
                origin: origin.to_string()
            }),
            "{origin}"
        );
    }
}

#[test]
fn test_preflight_handler_answers_204_without_cors() {
    let mut builder = RouterBuilder::new();
    builder.preflight("/bare");
    builder.get("/bare", handler(|_| HandlerResponse::empty(200)));
    let d = Dispatcher::new(builder.build(&ControllerRegistry::new()).unwrap());

    let res = d.dispatch(IncomingRequest::new("OPTIONS", "/bare"));
    assert_eq!(res.status, 204);
}
