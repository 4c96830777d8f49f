//! Request authentication + authorization
//!
//! Every protected endpoint resolves the caller from its token first, then
//! runs the role / permission / ownership checks below before touching
//! any state. The checks are plain functions over the resolved account so
//! they compose in whatever order an endpoint needs.

use crate::shared::handlers::postgres_handler::PostgresHandler;
use crate::shared::types::account::{permissions_for, Account, Role};
use crate::shared::types::app::ErrorResponse;
use crate::shared::util::jwt;

use actix_web::{dev::Payload, error, http::header, web::Data, FromRequest, HttpRequest, HttpResponse};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

pub const TOKEN_COOKIE: &str = "token";

/// Token signing secret, loaded once at startup and shared via app data
#[derive(Clone)]
pub struct TokenSecret(pub Vec<u8>);

impl TokenSecret {
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AuthError {
    /// No token on the request
    Unauthenticated,
    /// Token failed the signature or expiry check
    InvalidToken,
    /// Token was valid but the embedded account no longer exists
    UnknownAccount,
    /// Account exists but is suspended
    Suspended,
    /// Role has no permission entry at all
    MisconfiguredRole,
    Forbidden
}

/// Distinct kinds are kept for logging; unauthenticated callers all see
/// the same message so the response does not reveal why the token failed
pub fn error_response(err: &AuthError) -> HttpResponse {
    match err {
        AuthError::Unauthenticated | AuthError::InvalidToken | AuthError::UnknownAccount =>
            HttpResponse::Unauthorized().json(ErrorResponse::err("Unauthorized")),
        AuthError::Suspended =>
            HttpResponse::Forbidden().json(ErrorResponse::err("Account suspended")),
        AuthError::MisconfiguredRole | AuthError::Forbidden =>
            HttpResponse::Forbidden().json(ErrorResponse::err(
                "You do not have permission to perform this action"))
    }
}

/// Pull the raw token off a request: cookie first, then bearer header
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }
    let header = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(|t| t.to_string())
}

pub async fn resolve_caller(req: &HttpRequest) -> Result<Account, AuthError> {
    let token = token_from_request(req).ok_or(AuthError::Unauthenticated)?;

    let secret = req.app_data::<Data<TokenSecret>>().unwrap();
    let claims = jwt::verify(&token, secret.bytes()).map_err(|_| AuthError::InvalidToken)?;

    let handler = req.app_data::<Data<PostgresHandler>>().unwrap();
    let account = handler.get_user(&claims.sub).await
        .map_err(|_| AuthError::UnknownAccount)?;

    // Suspension takes effect on the next request, not at token expiry
    if account.suspended {
        return Err(AuthError::Suspended);
    }
    Ok(account)
}

/// The account resolved from the request credential. Extract as
/// `Option<Caller>` on endpoints that also serve anonymous callers.
pub struct Caller(pub Account);

impl FromRequest for Caller {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Caller, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match resolve_caller(&req).await {
                Ok(account) => Ok(Caller(account)),
                Err(err) => {
                    log::debug!("request auth failed: {:?}", err);
                    Err(error::InternalError::from_response("auth", error_response(&err)).into())
                }
            }
        })
    }
}

pub fn require_role(account: &Account, allowed: &[Role]) -> Result<(), AuthError> {
    if !allowed.contains(&account.role) {
        return Err(AuthError::Forbidden);
    }
    Ok(())
}

pub fn require_permission(account: &Account, permission: &str) -> Result<(), AuthError> {
    let granted = permissions_for(account.role);
    if granted.is_empty() {
        return Err(AuthError::MisconfiguredRole);
    }
    if !granted.iter().any(|p| *p == permission) {
        return Err(AuthError::Forbidden);
    }
    Ok(())
}

/// Owner-or-admin rule for mutating a resource someone created
pub fn assert_can_mutate(caller: &Account, owner_id: &Uuid) -> Result<(), AuthError> {
    if caller.id == *owner_id || caller.role == Role::Admin {
        return Ok(());
    }
    Err(AuthError::Forbidden)
}

/// An account can never delete itself, regardless of role
pub fn check_account_delete(caller: &Account, target_id: &Uuid) -> Result<(), AuthError> {
    if caller.id == *target_id {
        return Err(AuthError::Forbidden);
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum RoleChangeError {
    InvalidRole,
    SelfDemotionForbidden
}

/// Validate a role transition request. An admin may "change" their own
/// role only to admin itself; they can never drop their own admin rights,
/// even when other admins exist. Other roles carry no such rule
pub fn check_role_change(actor: &Account, target_id: &Uuid, new_role: &str)
        -> Result<Role, RoleChangeError> {
    let new_role = Role::parse(new_role).ok_or(RoleChangeError::InvalidRole)?;
    if actor.role == Role::Admin && actor.id == *target_id && new_role != Role::Admin {
        return Err(RoleChangeError::SelfDemotionForbidden);
    }
    Ok(new_role)
}
