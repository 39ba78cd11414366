//! Credential store handlers.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use yatube_core::domain::User;
use yatube_core::ports::{BaseRepository, PasswordService, TokenService};
use yatube_shared::dto::{AuthResponse, LoginRequest, NextQuery, SignupRequest};

use super::forms::field_errors;
use super::render;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub const LOGIN_TEMPLATE: &str = "users/login.html";

#[derive(Serialize)]
struct LoginContext {
    next: Option<String>,
}

fn issue_token(tokens: &dyn TokenService, user: &User) -> AppResult<AuthResponse> {
    let token = tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.expiration_seconds().max(0) as u64,
    })
}

/// GET /auth/login/ - where login-required pages send anonymous visitors.
pub async fn login_page(query: web::Query<NextQuery>) -> HttpResponse {
    render(
        LOGIN_TEMPLATE,
        LoginContext {
            next: query.into_inner().next,
        },
    )
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if let Err(errors) = req.validate() {
        let detail = field_errors(&errors)
            .into_iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::BadRequest(detail));
    }

    let username = req.username.trim().to_string();
    if state.repos.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }

    let password_hash = password_service
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state
        .repos
        .users
        .create(User::new(username, password_hash))
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");

    Ok(HttpResponse::Created().json(issue_token(token_service.get_ref().as_ref(), &user)?))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .repos
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::debug!(username = %user.username, "Rejected login");
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(token_service.get_ref().as_ref(), &user)?))
}
