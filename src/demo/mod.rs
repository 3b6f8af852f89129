//! Bundled demo application used by the `tollgate` binary.
//!
//! Routes:
//!
//! ```text
//! GET     /                         Home.index
//! GET     /users                    Home.index
//! GET     /users/add                Home.add
//! GET     /users/add/{id:num}       Home.add
//! OPTIONS /api/auth/login           (preflight)          [cors]
//! POST    /api/auth/login           Auth.login           [cors]
//! GET     /api/me                   User.me              [cors, auth]
//! POST    /api/users/{id}/like      User.like            [cors, auth]
//! GET     /api/admin/stats          Admin.stats          [cors, role:admin]
//! ```

mod controllers;

use std::sync::Arc;

use anyhow::{Context, Result};
use ulid::Ulid;

use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::middleware::{AuthMiddleware, CorsMiddleware, Middleware, RoleMiddleware};
use crate::registry::ControllerRegistry;
use crate::router::RouterBuilder;
use crate::security::{
    Clock, IdentityResolver, InMemoryUserRepository, RevocationList, SystemClock, TokenConfig,
    TokenService, UserRecord,
};

/// Fully wired demo application.
pub struct DemoApp {
    pub dispatcher: Dispatcher,
    pub tokens: Arc<TokenService>,
    pub resolver: Arc<IdentityResolver>,
    pub users: Arc<InMemoryUserRepository>,
    pub revocations: RevocationList,
}

impl DemoApp {
    /// Wire the demo with the system clock.
    pub fn build(config: &AppConfig) -> Result<Self> {
        Self::build_with_clock(config, Arc::new(SystemClock))
    }

    pub fn build_with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::wire(config, config.token_config()?, clock)
    }

    /// The route table as `dump_routes` lines.
    ///
    /// Needs no token secret: without one the demo is wired with a random secret that never
    /// leaves this call.
    pub fn route_listing(config: &AppConfig) -> Result<Vec<String>> {
        let token_config = match config.token_config() {
            Ok(token_config) => token_config,
            Err(_) => TokenConfig::new(format!("{}{}", Ulid::new(), Ulid::new())),
        };
        let app = Self::wire(config, token_config, Arc::new(SystemClock))?;
        Ok(app.dispatcher.router().dump_routes())
    }

    fn wire(config: &AppConfig, token_config: TokenConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let tokens =
            Arc::new(TokenService::new(token_config, clock).context("invalid token settings")?);
        let users = Arc::new(seed_users());
        let revocations = RevocationList::new();
        let resolver = Arc::new(
            IdentityResolver::new(Arc::clone(&tokens), users.clone())
                .with_revocation(Arc::new(revocations.clone())),
        );

        let mut registry = ControllerRegistry::new();
        registry
            .register(controllers::home())
            .register(controllers::auth(Arc::clone(&tokens), Arc::clone(&users)))
            .register(controllers::user())
            .register(controllers::admin(Arc::clone(&users)));

        let cors: Arc<dyn Middleware> =
            Arc::new(CorsMiddleware::from_config(&config.cors).context("invalid CORS settings")?);
        let auth: Arc<dyn Middleware> = Arc::new(AuthMiddleware::new(Arc::clone(&resolver)));
        let admin: Arc<dyn Middleware> =
            Arc::new(RoleMiddleware::new(Arc::clone(&resolver), "admin"));

        let mut builder = RouterBuilder::new();
        builder.get("/", "Home.index");
        builder.group("/users", vec![], |g| {
            g.get("/", "Home.index")
                .get("/add", "Home.add")
                .get("/add/{id:num}", "Home.add");
        });
        builder.group("/api", vec![cors], |api| {
            api.preflight("/auth/login").post("/auth/login", "Auth.login");
            api.group("/", vec![auth], |authed| {
                authed
                    .preflight("/me")
                    .get("/me", "User.me")
                    .preflight("/users/{id}/like")
                    .post("/users/{id}/like", "User.like");
            });
            api.group("/admin", vec![admin], |g| {
                g.get("/stats", "Admin.stats");
            });
        });

        let router = builder
            .build(&registry)
            .context("demo route table is invalid")?;

        Ok(Self {
            dispatcher: Dispatcher::new(router),
            tokens,
            resolver,
            users,
            revocations,
        })
    }
}

fn seed_users() -> InMemoryUserRepository {
    InMemoryUserRepository::new()
        .with_user(UserRecord::new("1", "ada", "admin").with_profile("email", "ada@example.com"))
        .with_user(
            UserRecord::new("2", "grace", "user").with_profile("email", "grace@example.com"),
        )
}
