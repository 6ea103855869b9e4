//! Inbound authentication contract: every tenant request carries
//! `Authorization: Bearer <opaque>` and resolves to a principal. The token
//! resolver itself is an injected collaborator (`AuthPort`) -- this crate
//! only defines the port, the `FromRequest` extractor, and a deterministic
//! test double, decoding a bearer token while keeping the decision of
//! *what a token means* external.

use std::collections::HashSet;
use std::future::{ready, Ready};

use actix_web::{error::ErrorUnauthorized, http::header, web, Error, FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Scheduler,
    Viewer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub roles: Vec<Role>,
    pub feature_flags: std::collections::HashMap<String, bool>,
}

impl Principal {
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }

    pub fn require_admin(&self) -> Result<(), crate::error::ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(crate::error::ApiError::Forbidden(
                "ADMIN role required".to_string(),
            ))
        }
    }

    pub fn feature_enabled(&self, flag: &str) -> bool {
        self.feature_flags.get(flag).copied().unwrap_or(false)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing or malformed Authorization header")]
    MissingToken,
    #[error("token rejected: {0}")]
    Rejected(String),
}

/// The auth collaborator boundary: resolving an opaque bearer token into a
/// principal is out of scope here — implementations are injected.
pub trait AuthPort: Send + Sync {
    fn resolve(&self, bearer_token: &str) -> Result<Principal, AuthError>;
}

/// A deterministic test double: the "token" is itself the JSON-encoded
/// principal, letting integration tests construct arbitrary principals
/// without a real token issuer.
pub struct PassthroughAuth;

impl AuthPort for PassthroughAuth {
    fn resolve(&self, bearer_token: &str) -> Result<Principal, AuthError> {
        serde_json::from_str(bearer_token).map_err(|e| AuthError::Rejected(e.to_string()))
    }
}

impl FromRequest for Principal {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let auth_port = req.app_data::<web::Data<Box<dyn AuthPort>>>().cloned();

        let result = (|| {
            let header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .ok_or(AuthError::MissingToken)?;

            let token = header
                .strip_prefix("Bearer ")
                .ok_or(AuthError::MissingToken)?;

            let auth_port = auth_port.ok_or(AuthError::Rejected(
                "auth collaborator not configured".to_string(),
            ))?;

            auth_port.resolve(token)
        })();

        ready(result.map_err(|e| ErrorUnauthorized(e.to_string())))
    }
}

pub fn roles(raw: &[&str]) -> HashSet<Role> {
    raw.iter()
        .filter_map(|r| match *r {
            "ADMIN" => Some(Role::Admin),
            "SCHEDULER" => Some(Role::Scheduler),
            "VIEWER" => Some(Role::Viewer),
            _ => None,
        })
        .collect()
}
