use std::sync::Arc;

use serde_json::json;
use tracing::error;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::error::HttpError;
use crate::registry::Controller;
use crate::security::{Claims, InMemoryUserRepository, TokenService};

pub(super) fn home() -> Controller {
    Controller::new("HomeController")
        .method("index", |_req: &HandlerRequest| {
            HandlerResponse::success(json!({ "page": "home" }))
        })
        .method("add", |req: &HandlerRequest| {
            HandlerResponse::success(json!({
                "action": "add",
                "id": req.get_path_param("id"),
            }))
        })
}

/// `POST /api/auth/login` with `{"username": ...}`: issues a session token for a known user.
pub(super) fn auth(tokens: Arc<TokenService>, users: Arc<InMemoryUserRepository>) -> Controller {
    Controller::new("AuthController").method("login", move |req: &HandlerRequest| {
        let Some(username) = req
            .body
            .as_ref()
            .and_then(|b| b.get("username"))
            .and_then(|u| u.as_str())
        else {
            return HandlerResponse::json(
                400,
                json!({
                    "status": "error",
                    "data": { "code": 400, "error": "invalid_request", "message": "username is required" }
                }),
            );
        };

        let Some(user) = users.all().into_iter().find(|u| u.username == username) else {
            return HttpError::UserNotFound.to_response();
        };

        match tokens.issue(Claims::for_user(&user.id, &user.role)) {
            Ok(token) => HandlerResponse::success(json!({
                "token": token,
                "expires_in": tokens.ttl_secs(),
                "user": user,
            })),
            Err(e) => {
                error!(user_id = %user.id, error = %e, "Token issue failed");
                HttpError::Internal.to_response()
            }
        }
    })
}

pub(super) fn user() -> Controller {
    Controller::new("UserController")
        .method("me", |req: &HandlerRequest| match &req.identity {
            Some(identity) => HandlerResponse::success(json!(identity.user)),
            None => HttpError::MissingToken.to_response(),
        })
        .method("like", |req: &HandlerRequest| {
            let liked_by = req.identity.as_ref().map(|i| i.user.id.clone());
            HandlerResponse::success_with_status(
                201,
                json!({ "liked": req.get_path_param("id"), "by": liked_by }),
            )
        })
}

pub(super) fn admin(users: Arc<InMemoryUserRepository>) -> Controller {
    Controller::new("AdminController").method("stats", move |_req: &HandlerRequest| {
        let all = users.all();
        let admins = all.iter().filter(|u| u.role == "admin").count();
        HandlerResponse::success(json!({ "users": all.len(), "admins": admins }))
    })
}
