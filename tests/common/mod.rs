#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tollgate::dispatcher::{HandlerRequest, HandlerResponse};
use tollgate::middleware::{Flow, Middleware};
use tollgate::security::{
    IdentityResolver, InMemoryUserRepository, ManualClock, TokenConfig, TokenService, UserRecord,
};

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const START: u64 = 1_700_000_000;

/// Token service, resolver and user store sharing one manual clock.
pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub tokens: Arc<TokenService>,
    pub users: Arc<InMemoryUserRepository>,
    pub resolver: Arc<IdentityResolver>,
}

impl Fixture {
    pub fn new(ttl_secs: u64) -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let tokens = Arc::new(
            TokenService::new(
                TokenConfig::new(SECRET).with_ttl_secs(ttl_secs),
                clock.clone(),
            )
            .unwrap(),
        );
        let users = Arc::new(
            InMemoryUserRepository::new()
                .with_user(UserRecord::new("42", "ada", "user"))
                .with_user(UserRecord::new("1", "root", "admin")),
        );
        let resolver = Arc::new(IdentityResolver::new(tokens.clone(), users.clone()));
        Self {
            clock,
            tokens,
            users,
            resolver,
        }
    }

    pub fn token(&self, user_id: &str, role: &str) -> String {
        self.tokens
            .issue(tollgate::security::Claims::for_user(user_id, role))
            .unwrap()
    }
}

/// Handler that counts its invocations.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn handler(&self) -> tollgate::HandlerRef {
        let counter = Arc::clone(&self.0);
        tollgate::handler(move |req: &HandlerRequest| {
            counter.fetch_add(1, Ordering::SeqCst);
            HandlerResponse::success(serde_json::json!({
                "params": req.merged_params(),
                "user": req.identity.as_ref().map(|i| i.user.id.clone()),
            }))
        })
    }
}

/// Middleware that appends its name to a shared log and continues (or halts).
pub struct Recorder {
    pub name: String,
    pub log: Arc<Mutex<Vec<String>>>,
    pub halt: bool,
}

impl Recorder {
    pub fn continuing(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Middleware> {
        Arc::new(Self {
            name: name.to_string(),
            log: Arc::clone(log),
            halt: false,
        })
    }

    pub fn halting(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Middleware> {
        Arc::new(Self {
            name: name.to_string(),
            log: Arc::clone(log),
            halt: true,
        })
    }
}

impl Middleware for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, _req: &mut HandlerRequest, res: &mut HandlerResponse) -> anyhow::Result<Flow> {
        self.log.lock().unwrap().push(self.name.clone());
        res.set_header(&format!("x-seen-{}", self.name), "1".to_string());
        if self.halt {
            res.status = 418;
            Ok(Flow::Halt)
        } else {
            Ok(Flow::Continue)
        }
    }
}
