use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http::Method;
use tracing::{error, info, info_span, warn};

use super::request::{HandlerRequest, HandlerResponse, IncomingRequest};
use crate::error::HttpError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::{panic_message, run_chain, Flow};
use crate::router::{normalize_path, parse_query, split_uri, HandlerTarget, ParamVec, Router};

/// Single entry point between the host transport and the route table.
///
/// `Dispatcher` holds no per-request state; share one instance across request threads.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    #[must_use]
    pub fn from_shared(router: Arc<Router>) -> Self {
        Self { router }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Route, run the middleware chain, invoke the handler.
    ///
    /// Never panics and never returns an unstructured error: every failure is rendered as a
    /// JSON error envelope. The response always carries `x-request-id`.
    pub fn dispatch(&self, incoming: IncomingRequest) -> HandlerResponse {
        let start = Instant::now();
        let request_id = RequestId::from_header_or_new(
            incoming
                .headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(REQUEST_ID_HEADER))
                .map(|(_, v)| v.as_str()),
        );
        let (raw_path, query) = split_uri(&incoming.uri);
        let path = normalize_path(raw_path);
        let query_params = parse_query(query);
        let method_upper = incoming.method.trim().to_ascii_uppercase();

        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            method = %method_upper,
            path = %path
        );
        let _entered = span.enter();

        let mut res = match Method::from_bytes(method_upper.as_bytes()) {
            Ok(method) => self.dispatch_matched(request_id, method, path, query_params, incoming),
            Err(_) => {
                warn!(method = %method_upper, "Unparsable request method");
                HttpError::RouteNotFound {
                    method: method_upper.clone(),
                    path,
                }
                .to_response()
            }
        };

        res.set_header(REQUEST_ID_HEADER, request_id.to_string());
        info!(
            status = res.status,
            latency_us = start.elapsed().as_micros(),
            "Request completed"
        );
        res
    }

    fn dispatch_matched(
        &self,
        request_id: RequestId,
        method: Method,
        path: String,
        query_params: ParamVec,
        incoming: IncomingRequest,
    ) -> HandlerResponse {
        let Some(route_match) = self.router.route(&method, &path) else {
            return HttpError::RouteNotFound {
                method: method.to_string(),
                path,
            }
            .to_response();
        };
        let route = route_match.route;

        let mut req = HandlerRequest {
            request_id,
            method,
            path,
            handler_name: route.handler_name().to_string(),
            path_params: route_match.path_params,
            query_params,
            headers: incoming.headers,
            body: incoming.body,
            identity: None,
            jwt_claims: None,
        };
        let mut res = HandlerResponse::default();

        if run_chain(&route.middleware, &mut req, &mut res) == Flow::Halt {
            return res;
        }

        match &route.target {
            HandlerTarget::Unresolved { label, error } => {
                error!(
                    handler_name = %label,
                    error = %error,
                    "Handler resolution failed"
                );
                HttpError::HandlerResolution(error.clone()).write_to(&mut res);
                res
            }
            HandlerTarget::Resolved { label, handler } => {
                let execution_start = Instant::now();
                match catch_unwind(AssertUnwindSafe(|| handler.call(&req))) {
                    Ok(mut out) => {
                        info!(
                            handler_name = %label,
                            status = out.status,
                            execution_time_us = execution_start.elapsed().as_micros(),
                            "Handler execution complete"
                        );
                        out.inherit_headers(&res.headers);
                        out
                    }
                    Err(panic) => {
                        error!(
                            handler_name = %label,
                            panic_message = %panic_message(panic.as_ref()),
                            "Handler panicked"
                        );
                        HttpError::HandlerFailure {
                            handler: label.clone(),
                        }
                        .write_to(&mut res);
                        res
                    }
                }
            }
        }
    }
}
