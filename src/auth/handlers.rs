use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::service::{AuthenticatedUser, GoogleProfile, NewRegistration};
use crate::db::models::User;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// Cookie carrying the refresh token. The name is part of the wire contract
/// with existing clients.
pub const REFRESH_COOKIE: &str = "jwt";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetUserQuery {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    id: Uuid,
    name: String,
    email: String,
    avatar: String,
    #[serde(rename = "accessToken")]
    access_token: String,
}

impl ProfileResponse {
    fn new(user: &User, access_token: String) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            access_token,
        }
    }
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    info!("Received registration request for email: {:?}", req.email);

    let input = NewRegistration {
        name: req.name,
        email: req.email,
        password: req.password,
        avatar: req.avatar,
    };

    match state.auth_service.register(input).await {
        Ok(authed) => {
            info!("Registration successful for email: {}", authed.user.email);
            Ok(HttpResponse::Created()
                .cookie(refresh_cookie(state.as_ref(), &authed.refresh_token))
                .json(json!({
                    "name": authed.user.name,
                    "avatar": authed.user.avatar,
                    "accessToken": authed.access_token,
                    "email": authed.user.email,
                })))
        }
        Err(e) => {
            error!("Registration failed: {}", e);
            Err(e)
        }
    }
}

pub async fn login(
    http_req: HttpRequest,
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    info!("Received login request for email: {:?}", req.email);

    let presented = presented_token(&http_req);
    match state
        .auth_service
        .login(req.email, req.password, presented.as_deref())
        .await
    {
        Ok(authed) => {
            info!("Login successful for email: {}", authed.user.email);
            Ok(logged_in_response(state.as_ref(), authed))
        }
        Err(e) => {
            error!("Login failed: {}", e);
            Err(e)
        }
    }
}

pub async fn google_login(
    http_req: HttpRequest,
    req: web::Json<GoogleLoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    info!("Received google login request for email: {:?}", req.email);

    let profile = GoogleProfile {
        email: req.email,
        name: req.name,
        avatar: req.avatar,
    };

    let presented = presented_token(&http_req);
    match state
        .auth_service
        .google_login(profile, presented.as_deref())
        .await
    {
        Ok(authed) => {
            info!("Google login successful for email: {}", authed.user.email);
            Ok(logged_in_response(state.as_ref(), authed))
        }
        Err(e) => {
            error!("Google login failed: {}", e);
            Err(e)
        }
    }
}

/// Standalone refresh. The presented cookie is single-use: the response
/// always either replaces it (success) or clears it (403 outcomes). A missing
/// cookie is a bare 401.
pub async fn handle_refresh_token(
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_token(&http_req);

    match state.auth_service.refresh(presented.as_deref()).await {
        Ok(tokens) => Ok(HttpResponse::Ok()
            .cookie(refresh_cookie(state.as_ref(), &tokens.cookie_token))
            .json(json!({
                "accessToken": tokens.access_token,
                "refreshToken": tokens.presented_token,
            }))),
        Err(AppError::Auth(AuthError::NoRefreshCookie)) => {
            Ok(HttpResponse::Unauthorized().finish())
        }
        Err(e @ AppError::Auth(
            AuthError::ReuseDetected
            | AuthError::InvalidRefreshToken
            | AuthError::TokenOwnerMismatch,
        )) => {
            warn!("Refresh rejected: {}", e);
            let mut response = HttpResponse::Forbidden();
            response.cookie(clear_refresh_cookie());
            Ok(response.finish())
        }
        Err(e) => {
            error!("Refresh failed: {}", e);
            Err(e)
        }
    }
}

pub async fn logout(
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_token(&http_req);
    state.auth_service.logout(presented.as_deref()).await?;

    Ok(HttpResponse::Ok()
        .cookie(clear_refresh_cookie())
        .json(json!({ "message": "Successfully Logged Out" })))
}

pub async fn check_login(
    http_req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_token(&http_req);

    match state.auth_service.check_login(presented.as_deref()).await? {
        Some((user, access_token)) => {
            Ok(HttpResponse::Ok().json(ProfileResponse::new(&user, access_token)))
        }
        None => Ok(HttpResponse::Ok().json(json!({ "login": false }))),
    }
}

pub async fn get_user(
    query: web::Query<GetUserQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state.auth_service.get_user(query.id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "avatar": user.avatar,
    })))
}

fn presented_token(req: &HttpRequest) -> Option<String> {
    req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string())
}

fn logged_in_response(state: &AppState, authed: AuthenticatedUser) -> HttpResponse {
    let profile = ProfileResponse::new(&authed.user, authed.access_token);
    HttpResponse::Ok()
        .cookie(refresh_cookie(state, &authed.refresh_token))
        .json(profile)
}

fn refresh_cookie(state: &AppState, token: &str) -> Cookie<'static> {
    let max_age = state.auth_service.tokens().refresh_expiry();
    Cookie::build(REFRESH_COOKIE, token.to_owned())
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(CookieDuration::seconds(max_age.num_seconds()))
        .finish()
}

fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, "")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(CookieDuration::ZERO)
        .finish()
}
