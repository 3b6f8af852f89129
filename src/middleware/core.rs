use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error};

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::HttpError;

/// Outcome of one middleware step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Hand the request to the next middleware (or the handler)
    Continue,
    /// Stop here; the middleware has written the response
    Halt,
}

/// A request gatekeeper.
///
/// Middleware may mutate the request (attach identity, claims) and write into the response
/// (headers, or a full error answer before halting). Returning `Err` or panicking stops the
/// chain with a generic `500 middleware_failure`.
pub trait Middleware: Send + Sync {
    /// Name used in logs and route dumps.
    fn name(&self) -> &str;

    fn handle(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) -> anyhow::Result<Flow>;
}

/// Run `chain` in order until one middleware halts.
///
/// Returns `Flow::Continue` only when every middleware continued.
pub(crate) fn run_chain(
    chain: &[Arc<dyn Middleware>],
    req: &mut HandlerRequest,
    res: &mut HandlerResponse,
) -> Flow {
    for mw in chain {
        let outcome = catch_unwind(AssertUnwindSafe(|| mw.handle(req, res)));
        match outcome {
            Ok(Ok(Flow::Continue)) => {}
            Ok(Ok(Flow::Halt)) => {
                debug!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    middleware = %mw.name(),
                    status = res.status,
                    "Middleware halted request"
                );
                return Flow::Halt;
            }
            Ok(Err(e)) => {
                error!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    middleware = %mw.name(),
                    error = %format!("{e:#}"),
                    "Middleware failed"
                );
                fail(mw.name(), res);
                return Flow::Halt;
            }
            Err(panic) => {
                error!(
                    request_id = %req.request_id,
                    method = %req.method,
                    path = %req.path,
                    middleware = %mw.name(),
                    panic_message = %panic_message(panic.as_ref()),
                    "Middleware panicked"
                );
                fail(mw.name(), res);
                return Flow::Halt;
            }
        }
    }
    Flow::Continue
}

fn fail(middleware: &str, res: &mut HandlerResponse) {
    HttpError::MiddlewareFailure {
        middleware: middleware.to_string(),
    }
    .write_to(res);
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
