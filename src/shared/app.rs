use crate::market::handlers::postgres_handler::PostgresHandler as MarketPostgresHandler;
use crate::shared::handlers::postgres_handler::{PostgresHandler, UserSearchResult};
use crate::shared::types::account::{AccountView, Role};
use crate::shared::types::app::{ErrorResponse, Response, forbidden, bad_request, not_found, server_error};
use crate::shared::util::auth::{self, Caller, RoleChangeError, TokenSecret};
use crate::shared::util::clean_text::clean_text;
use crate::shared::util::config;
use crate::shared::util::jwt;

use actix_web::{
    get, post, put, delete, HttpResponse, web::{self, Data},
    cookie::{time::Duration, Cookie, SameSite},
    Result
};

use regex::Regex;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use uuid::Uuid;

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap().is_match(email)
}

#[derive(Serialize)]
struct AccountReturn {
    success: bool,
    account: AccountView
}

#[derive(Deserialize)]
struct SignupForm {
    name: String,
    email: String,
    password: String,
    bio: Option<String>
}

#[post("/v1/auth/signup")]
pub async fn signup(handler: Data<PostgresHandler>, params: web::Json<SignupForm>) -> Result<HttpResponse> {
    let config = config::get_config();

    if params.name.is_empty() || params.name.len() > config.count.max_name_length {
        bad_request!("Name is missing or too long");
    }
    if !valid_email(params.email.as_str()) {
        bad_request!("Invalid email");
    }
    if params.password.len() < config.count.min_password_length ||
            params.password.len() > config.count.max_password_length {
        bad_request!(&format!("Password must be {} - {} characters (inclusive) in length",
            config.count.min_password_length, config.count.max_password_length));
    }
    let bio = clean_text(params.bio.as_deref().unwrap_or(""));
    if bio.len() > config.count.max_bio_length {
        bad_request!("Bio is too long");
    }

    if handler.find_by_email(params.email.as_str()).await.is_some() {
        bad_request!("An account with this email already exists");
    }

    // Role is never taken from the request: everyone signs up as a user
    match handler.create_account(
        params.name.as_str(),
        params.email.as_str(),
        params.password.as_str(),
        bio.as_str(),
        Role::User
    ).await {
        Ok(account) => Ok(HttpResponse::Created().json(
            AccountReturn { success: true, account: AccountView::from(&account) })),
        Err(_err) => server_error!("Failed to create account")
    }
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String
}

#[derive(Serialize)]
struct LoginReturn {
    success: bool,
    token: String,
    account: AccountView
}

#[post("/v1/auth/login")]
pub async fn login(handler: Data<PostgresHandler>, secret: Data<TokenSecret>, params: web::Json<LoginForm>) -> Result<HttpResponse> {
    let config = config::get_config();

    let account = match handler
        .can_login(params.email.as_str(), params.password.as_str()).await {
        Ok(account) => account,
        Err(_err) => server_error!("Login failed")
    };
    // One message for unknown email and wrong password
    let account = match account {
        Some(account) => account,
        None => return Ok(HttpResponse::Unauthorized().json(
            ErrorResponse::err("Invalid email or password")))
    };
    if account.suspended {
        forbidden!("Account suspended");
    }

    let ttl = config.server.token_valid_duration_seconds;
    let token = match jwt::sign(account.id, account.email.as_str(), account.role.as_str(), secret.bytes(), ttl) {
        Ok(token) => token,
        Err(_err) => server_error!("Login failed")
    };

    // The token rides an HTTP-only cookie for browsers and is also
    // returned in the body for bearer clients
    let cookie = Cookie::build(auth::TOKEN_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.server.production)
        .max_age(Duration::seconds(ttl))
        .finish();

    Ok(HttpResponse::Ok().cookie(cookie).json(LoginReturn {
        success: true,
        token,
        account: AccountView::from(&account)
    }))
}

#[post("/v1/auth/logout")]
pub async fn logout() -> Result<HttpResponse> {
    // Clears the cookie only. A bearer token already handed out stays
    // valid until it expires
    let mut cookie = Cookie::build(auth::TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .finish();
    cookie.make_removal();
    Ok(HttpResponse::Ok().cookie(cookie).json(Response::ok("You logged out")))
}

#[get("/v1/users/me")]
pub async fn me(caller: Caller) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    Ok(HttpResponse::Ok().json(AccountReturn { success: true, account: AccountView::from(&caller) }))
}

#[derive(Deserialize)]
struct ProfileForm {
    name: Option<String>,
    bio: Option<String>,
    pfp_url: Option<String>,
    settings: Option<Value>
}

#[put("/v1/users/me")]
pub async fn update_me(handler: Data<PostgresHandler>, caller: Caller, params: web::Json<ProfileForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    let config = config::get_config();

    if let Some(name) = &params.name {
        if name.is_empty() || name.len() > config.count.max_name_length {
            bad_request!("Name is missing or too long");
        }
    }
    let bio = params.bio.as_ref().map(|bio| clean_text(bio));
    if bio.as_ref().map(|bio| bio.len() > config.count.max_bio_length).unwrap_or(false) {
        bad_request!("Bio is too long");
    }

    match handler.change_profile(
        &caller.id,
        params.name.clone(),
        bio,
        params.pfp_url.clone(),
        params.settings.clone()
    ).await {
        Ok(account) => Ok(HttpResponse::Ok().json(
            AccountReturn { success: true, account: AccountView::from(&account) })),
        Err(_err) => server_error!("Failed to update profile")
    }
}

#[derive(Serialize)]
struct PublicUserReturn {
    success: bool,
    id: Uuid,
    name: String,
    bio: String,
    pfp_url: String
}

#[get("/v1/users/{id}")]
pub async fn get_user(handler: Data<PostgresHandler>, _caller: Caller, path: web::Path<Uuid>) -> Result<HttpResponse> {
    match handler.get_user(&path.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(PublicUserReturn {
            success: true,
            id: user.id,
            name: user.name,
            bio: user.bio,
            pfp_url: user.pfp_url
        })),
        Err(_err) => not_found!("User not found")
    }
}

#[derive(Deserialize)]
struct UserSearchParams { filter: String }

#[derive(Serialize)]
struct UserSearchReturn {
    success: bool,
    users: Vec<UserSearchResult>
}

#[get("/v1/users/search")]
pub async fn users_search(handler: Data<PostgresHandler>, _caller: Caller, params: web::Query<UserSearchParams>) -> Result<HttpResponse> {
    // Enforce filter is at least 2 characters long
    if params.filter.len() < 2 {
        bad_request!("Filter must be at least 2 characters long");
    }

    match handler.search_users(params.filter.as_str()).await {
        Ok(users) => Ok(HttpResponse::Ok().json(UserSearchReturn { success: true, users })),
        Err(_err) => server_error!("Error in search")
    }
}

#[derive(Deserialize)]
struct RoleForm { role: String }

#[put("/v1/users/{id}/role")]
pub async fn change_role(handler: Data<PostgresHandler>, caller: Caller, path: web::Path<Uuid>, params: web::Json<RoleForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    if let Err(err) = auth::require_permission(&caller, "change_role") {
        return Ok(auth::error_response(&err));
    }

    let target_id = path.into_inner();
    let new_role = match auth::check_role_change(&caller, &target_id, params.role.as_str()) {
        Ok(role) => role,
        Err(RoleChangeError::InvalidRole) => bad_request!("Invalid role"),
        Err(RoleChangeError::SelfDemotionForbidden) =>
            forbidden!("Admins cannot remove their own admin role")
    };

    if handler.get_user(&target_id).await.is_err() {
        not_found!("User not found");
    }

    match handler.change_role(&target_id, new_role).await {
        Ok(account) => Ok(HttpResponse::Ok().json(
            AccountReturn { success: true, account: AccountView::from(&account) })),
        Err(_err) => server_error!("Failed to change role")
    }
}

#[derive(Deserialize)]
struct StatusForm { suspended: bool }

#[put("/v1/users/{id}/status")]
pub async fn change_status(handler: Data<PostgresHandler>, caller: Caller, path: web::Path<Uuid>, params: web::Json<StatusForm>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    if let Err(err) = auth::require_permission(&caller, "suspend_user") {
        return Ok(auth::error_response(&err));
    }

    let target_id = path.into_inner();
    if handler.get_user(&target_id).await.is_err() {
        not_found!("User not found");
    }

    match handler.set_suspended(&target_id, params.suspended).await {
        Ok(account) => Ok(HttpResponse::Ok().json(
            AccountReturn { success: true, account: AccountView::from(&account) })),
        Err(_err) => server_error!("Failed to change account status")
    }
}

#[delete("/v1/users/{id}")]
pub async fn delete_user(handler: Data<PostgresHandler>, market_handler: Data<MarketPostgresHandler>,
        caller: Caller, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let Caller(caller) = caller;
    if let Err(err) = auth::require_permission(&caller, "delete_user") {
        return Ok(auth::error_response(&err));
    }

    let target_id = path.into_inner();
    if auth::check_account_delete(&caller, &target_id).is_err() {
        forbidden!("You cannot delete your own account");
    }
    if handler.get_user(&target_id).await.is_err() {
        not_found!("User not found");
    }

    // The account's market rows go first, they reference the user row
    if market_handler.delete_by_owner(&target_id).await.is_err() {
        server_error!("Failed to delete account");
    }
    match handler.delete_account(&target_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(Response::ok("Account deleted"))),
        Err(_err) => server_error!("Failed to delete account")
    }
}
