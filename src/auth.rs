use actix_web::{body, dev, http::{self, header::ContentType, StatusCode}, web, FromRequest, HttpRequest, HttpResponse};
use chrono::{Duration, Local};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{consts::{DEFAULT_TOKEN_TTL_HOURS, PERMISSION_WILDCARD}, payroll::TenantScope};

/// Issues and checks session tokens
pub struct Authority {
    jwt_key: (EncodingKey, DecodingKey),
    ttl: Duration,
}

impl Authority {
    pub fn new(jwt_key: &[u8]) -> Self {
        Self {
            jwt_key: (EncodingKey::from_secret(jwt_key), DecodingKey::from_secret(jwt_key)),
            ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn issue_for(&self, session: &Session) -> Result<String, AuthError> {
        let claims = Claims {
            exp: (Local::now() + self.ttl).timestamp(),
            data: session,
        };

        Ok(encode(&Header::default(), &claims, &self.jwt_key.0)?)
    }

    pub fn authorize(&self, token: impl AsRef<str>) -> Result<Session, AuthError> {
        let payload = decode::<Claims<Session>>(token.as_ref(), &self.jwt_key.1, &Validation::default())?;

        Ok(payload.claims.data)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims<T> {
    exp: i64,
    data: T,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authority error")]
    AuthorityError(#[from] jsonwebtoken::errors::Error),
}

impl actix_web::error::ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            AuthError::AuthorityError(_) => StatusCode::FORBIDDEN,
        }
    }
}

/// `true` when `permissions` holds `permission` or the wildcard
pub fn has_permission(permissions: &[String], permission: &str) -> bool {
    permissions.iter().any(|p| p == PERMISSION_WILDCARD || p == permission)
}

pub fn has_any_permission(permissions: &[String], wanted: &[&str]) -> bool {
    wanted.iter().any(|p| has_permission(permissions, p))
}

/// Who is calling and on behalf of which tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub username: String,
    pub permissions: Vec<String>,
}

impl Session {
    pub fn scope(&self) -> TenantScope {
        TenantScope {
            tenant_id: self.tenant_id,
            actor_id: self.user_id,
        }
    }

    pub fn require(&self, permission: &str) -> Result<(), actix_web::Error> {
        if !has_permission(&self.permissions, permission) {
            tracing::warn!(user_id = %self.user_id, permission, "permission denied");
            return Err(actix_web::error::ErrorForbidden("forbidden"));
        }

        Ok(())
    }

    pub fn require_any(&self, permissions: &[&str]) -> Result<(), actix_web::Error> {
        if !has_any_permission(&self.permissions, permissions) {
            tracing::warn!(user_id = %self.user_id, ?permissions, "permission denied");
            return Err(actix_web::error::ErrorForbidden("forbidden"));
        }

        Ok(())
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            // Basically grabs the value after space ( ) from `Authorization` header
            // Example: JWT sometoken
            //              ^ grabs this value
            let Some(Ok(Some((_, token)))) = req.headers()
                .get("Authorization")
                .map(|v|
                    v.to_str()
                        .map(|str| str.split_once(" "))
                )
            else {
                return Err(actix_web::error::ErrorUnauthorized("unauthorized"))
            };

            let Some(authority) = req.app_data::<web::Data<Authority>>() else {
                return Err(actix_web::error::ErrorInternalServerError("authority is not configured"))
            };
            let session = authority.authorize(token)?;

            Ok(session)
        })
    }
}
