//! Identity extractors and the login-required redirect.

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, http::header};
use std::future::{Ready, ready};
use std::sync::Arc;

use yatube_core::ports::{AuthError, TokenClaims, TokenService};

/// Where anonymous visitors of login-required pages are sent.
pub const LOGIN_URL: &str = "/auth/login/";

/// Authenticated user identity extractor.
///
/// Handlers taking an `Identity` are login-required: anonymous requests are
/// redirected to [`LOGIN_URL`] with the original path in `next`.
/// ```ignore
/// async fn follow_index(identity: Identity) -> impl Responder {
///     format!("Feed for {}", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Rejection for login-required pages: renders a redirect to the login page.
#[derive(Debug, thiserror::Error)]
#[error("login required for {next}: {reason}")]
pub struct LoginRequired {
    pub next: String,
    pub reason: AuthError,
}

impl LoginRequired {
    /// Login URL with `next` percent-encoded; path separators stay readable.
    pub fn location(&self) -> String {
        let next = urlencoding::encode(&self.next).replace("%2F", "/");
        format!("{}?next={}", LOGIN_URL, next)
    }
}

impl actix_web::ResponseError for LoginRequired {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, self.location()))
            .finish()
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    // Get token service from app data
    let token_service = req
        .app_data::<actix_web::web::Data<Arc<dyn TokenService>>>()
        .ok_or_else(|| {
            tracing::error!("TokenService not found in app data");
            AuthError::InvalidToken("Server configuration error".to_string())
        })?;

    // Extract Bearer token from Authorization header
    let auth_str = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    // Parse "Bearer <token>"
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    token_service.validate_token(token).map(Identity::from)
}

impl FromRequest for Identity {
    type Error = LoginRequired;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|reason| {
            tracing::debug!(path = %req.path(), %reason, "Redirecting anonymous request to login");
            LoginRequired {
                next: req.uri().path().to_string(),
                reason,
            }
        }))
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(authenticate(req).ok())))
    }
}
