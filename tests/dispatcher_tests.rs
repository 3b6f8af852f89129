//! Integration tests for request dispatch
//!
//! # Test Coverage
//!
//! - Route-not-found responses and method case folding
//! - Path/query parameter merge precedence
//! - Middleware ordering, halting and failure isolation
//! - Handler panics and unresolved descriptors
//! - Request ID propagation
//! - Dispatchers sharing one route table

use std::sync::{Arc, Mutex};

use http::Method;
use serde_json::json;
use tollgate::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse, IncomingRequest};
use tollgate::handler;
use tollgate::middleware::{Flow, Middleware};
use tollgate::registry::ControllerRegistry;
use tollgate::router::RouterBuilder;

mod common;
use common::{CallCounter, Recorder};

fn dispatcher(configure: impl FnOnce(&mut RouterBuilder)) -> Dispatcher {
    let mut builder = RouterBuilder::new();
    configure(&mut builder);
    Dispatcher::new(builder.build(&ControllerRegistry::new()).unwrap())
}

struct Failing;

impl Middleware for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn handle(&self, _req: &mut HandlerRequest, _res: &mut HandlerResponse) -> anyhow::Result<Flow> {
        anyhow::bail!("backing store unavailable")
    }
}

struct Panicking;

impl Middleware for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn handle(&self, _req: &mut HandlerRequest, _res: &mut HandlerResponse) -> anyhow::Result<Flow> {
        panic!("middleware bug")
    }
}

#[test]
fn test_unmatched_route_is_404() {
    let d = dispatcher(|b| {
        b.get("/", handler(|_| HandlerResponse::empty(200)));
    });
    let res = d.dispatch(IncomingRequest::new("GET", "/missing"));
    assert_eq!(res.status, 404);
    assert_eq!(res.body["status"], "error");
    assert_eq!(res.body["data"]["error"], "route_not_found");
}

#[test]
fn test_method_mismatch_is_404() {
    let d = dispatcher(|b| {
        b.post("/items", handler(|_| HandlerResponse::empty(201)));
    });
    assert_eq!(d.dispatch(IncomingRequest::new("GET", "/items")).status, 404);
    assert_eq!(d.dispatch(IncomingRequest::new("POST", "/items")).status, 201);
}

#[test]
fn test_method_is_case_insensitive() {
    let d = dispatcher(|b| {
        b.get("/ping", handler(|_| HandlerResponse::empty(200)));
    });
    assert_eq!(d.dispatch(IncomingRequest::new("get", "/ping")).status, 200);
    assert_eq!(d.dispatch(IncomingRequest::new(" Get ", "/ping")).status, 200);
}

#[test]
fn test_unparsable_method_is_404() {
    let d = dispatcher(|b| {
        b.get("/ping", handler(|_| HandlerResponse::empty(200)));
    });
    let res = d.dispatch(IncomingRequest::new("BAD METHOD", "/ping"));
    assert_eq!(res.status, 404);
}

#[test]
fn test_path_params_win_over_query_params() {
    let counter = CallCounter::default();
    let d = dispatcher(|b| {
        b.get("/users/{id}", counter.handler());
    });

    let res = d.dispatch(IncomingRequest::new("GET", "/users/42?id=7&sort=asc"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body["data"]["params"]["id"], "42");
    assert_eq!(res.body["data"]["params"]["sort"], "asc");
    assert_eq!(counter.count(), 1);
}

#[test]
fn test_query_string_and_trailing_slash_do_not_affect_matching() {
    let d = dispatcher(|b| {
        b.get("/users", handler(|_| HandlerResponse::empty(200)));
    });
    assert_eq!(d.dispatch(IncomingRequest::new("GET", "/users/?page=2")).status, 200);
}

#[test]
fn test_handler_sees_request_context() {
    let d = dispatcher(|b| {
        b.post(
            "/echo/{name}",
            handler(|req| {
                HandlerResponse::success(json!({
                    "method": req.method.as_str(),
                    "path": req.path,
                    "name": req.param("name"),
                    "positional": req.positional_params().collect::<Vec<_>>(),
                    "agent": req.get_header("user-agent"),
                    "body": req.body,
                    "handler": req.handler_name,
                }))
            }),
        );
    });

    let res = d.dispatch(
        IncomingRequest::new("POST", "/echo/ada/")
            .header("User-Agent", "tests")
            .body(json!({"k": 1})),
    );
    let data = &res.body["data"];
    assert_eq!(data["method"], "POST");
    assert_eq!(data["path"], "/echo/ada");
    assert_eq!(data["name"], "ada");
    assert_eq!(data["positional"], json!(["ada"]));
    assert_eq!(data["agent"], "tests");
    assert_eq!(data["body"]["k"], 1);
    assert_eq!(data["handler"], "<closure>");
}

#[test]
fn test_middleware_runs_in_declaration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let counter = CallCounter::default();
    let first = Recorder::continuing("first", &log);
    let second = Recorder::continuing("second", &log);
    let third = Recorder::continuing("third", &log);

    let d = dispatcher(|b| {
        b.group("/g", vec![first], |g| {
            g.route(Method::GET, "/x", counter.handler(), vec![second, third]);
        });
    });

    let res = d.dispatch(IncomingRequest::new("GET", "/g/x"));
    assert_eq!(res.status, 200);
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    assert_eq!(counter.count(), 1);
}

#[test]
fn test_halting_middleware_short_circuits() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let counter = CallCounter::default();
    let gate = Recorder::halting("gate", &log);
    let after = Recorder::continuing("after", &log);

    let d = dispatcher(|b| {
        b.route(Method::GET, "/x", counter.handler(), vec![gate, after]);
    });

    let res = d.dispatch(IncomingRequest::new("GET", "/x"));
    assert_eq!(res.status, 418);
    assert_eq!(res.get_header("x-seen-gate"), Some("1"));
    assert_eq!(*log.lock().unwrap(), vec!["gate"]);
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_middleware_headers_are_inherited_by_handler_response() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let seen = Recorder::continuing("mw", &log);

    let d = dispatcher(|b| {
        b.route(
            Method::GET,
            "/x",
            handler(|_| {
                let mut res = HandlerResponse::empty(200);
                res.set_header("x-own", "handler".to_string());
                res
            }),
            vec![seen],
        );
    });

    let res = d.dispatch(IncomingRequest::new("GET", "/x"));
    assert_eq!(res.get_header("x-seen-mw"), Some("1"));
    assert_eq!(res.get_header("x-own"), Some("handler"));
}

#[test]
fn test_middleware_error_becomes_500() {
    let counter = CallCounter::default();
    let failing: Arc<dyn Middleware> = Arc::new(Failing);
    let d = dispatcher(|b| {
        b.route(Method::GET, "/x", counter.handler(), vec![failing]);
    });

    let res = d.dispatch(IncomingRequest::new("GET", "/x"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body["data"]["error"], "middleware_failure");
    assert!(!res.body.to_string().contains("backing store"));
    assert_eq!(counter.count(), 0);
}

#[test]
fn test_middleware_panic_becomes_500_and_dispatcher_survives() {
    let panicking: Arc<dyn Middleware> = Arc::new(Panicking);
    let d = dispatcher(|b| {
        b.route(
            Method::GET,
            "/boom",
            handler(|_| HandlerResponse::empty(200)),
            vec![panicking],
        );
        b.get("/ok", handler(|_| HandlerResponse::empty(200)));
    });

    let res = d.dispatch(IncomingRequest::new("GET", "/boom"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body["data"]["error"], "middleware_failure");
    assert_eq!(d.dispatch(IncomingRequest::new("GET", "/ok")).status, 200);
}

#[test]
fn test_handler_panic_becomes_500() {
    let d = dispatcher(|b| {
        b.get("/boom", handler(|_| panic!("handler bug")));
    });
    let res = d.dispatch(IncomingRequest::new("GET", "/boom"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body["data"]["error"], "handler_failure");
    assert!(res.get_header("x-request-id").is_some());
}

#[test]
fn test_unresolved_descriptor_answers_500_at_request_time() {
    let mut builder = RouterBuilder::new();
    builder.get("/ghost", "Ghost.index");
    builder.get("/ok", handler(|_| HandlerResponse::empty(200)));
    let router = builder.build_unchecked(&ControllerRegistry::new());
    assert!(router.routes()[0].is_unresolved());
    let d = Dispatcher::new(router);

    let res = d.dispatch(IncomingRequest::new("GET", "/ghost"));
    assert_eq!(res.status, 500);
    assert_eq!(res.body["data"]["error"], "handler_resolution_failure");
    assert!(res.body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("Ghost"));
    assert_eq!(d.dispatch(IncomingRequest::new("GET", "/ok")).status, 200);
}

#[test]
fn test_request_id_is_echoed_or_generated() {
    let d = dispatcher(|b| {
        b.get("/", handler(|req| HandlerResponse::success(json!(req.request_id.to_string()))));
    });

    let supplied = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    let res = d.dispatch(IncomingRequest::new("GET", "/").header("X-Request-Id", supplied));
    assert_eq!(res.get_header("x-request-id"), Some(supplied));
    assert_eq!(res.body["data"], supplied);

    let res = d.dispatch(IncomingRequest::new("GET", "/"));
    let generated = res.get_header("x-request-id").unwrap();
    assert_eq!(generated.len(), 26);

    let res = d.dispatch(IncomingRequest::new("GET", "/missing"));
    assert!(res.get_header("x-request-id").is_some());
}

#[test]
fn test_dispatchers_can_share_one_route_table() {
    let counter = CallCounter::default();
    let mut builder = RouterBuilder::new();
    builder.get("/items/{id:num}", counter.handler());
    let router = Arc::new(builder.build(&ControllerRegistry::new()).unwrap());

    let a = Dispatcher::from_shared(Arc::clone(&router));
    let b = Dispatcher::from_shared(Arc::clone(&router));
    assert!(std::ptr::eq(a.router(), b.router()));
    assert_eq!(Arc::strong_count(&router), 3);

    assert_eq!(a.dispatch(IncomingRequest::new("GET", "/items/1")).status, 200);
    assert_eq!(b.dispatch(IncomingRequest::new("GET", "/items/2")).status, 200);
    assert_eq!(counter.count(), 2);
}

#[test]
fn test_dispatcher_is_shared_across_threads() {
    let counter = CallCounter::default();
    let d = dispatcher(|b| {
        b.get("/n/{n:num}", counter.handler());
    });

    std::thread::scope(|s| {
        for i in 0..8 {
            let d = &d;
            s.spawn(move || {
                let res = d.dispatch(IncomingRequest::new("GET", format!("/n/{i}")));
                assert_eq!(res.status, 200);
                assert_eq!(res.body["data"]["params"]["n"], i.to_string());
            });
        }
    });
    assert_eq!(counter.count(), 8);
}
