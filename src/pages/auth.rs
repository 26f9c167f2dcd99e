use actix_web::{get, post, web, Responder};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{auth::{Authority, Session}, entity::{prelude::*, user}};

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(login)
        .service(whoami);
}

#[derive(Debug, Serialize, Deserialize)]
struct Login {
    username: String,
    password: String,
}

fn session_of(user: &user::Model) -> Result<Session, actix_web::Error> {
    let permissions = serde_json::from_value::<Vec<String>>(user.permissions.clone())
        .map_err(|err| {
            tracing::error!(user_id = %user.id, error = %err, "stored permissions are not a list of strings");
            actix_web::error::ErrorInternalServerError("invalid permissions")
        })?;

    Ok(Session {
        user_id: user.id,
        tenant_id: user.tenant_id,
        username: user.username.clone(),
        permissions,
    })
}

#[post("/login")]
async fn login(db: web::Data<DatabaseConnection>, authority: web::Data<Authority>, credentials: web::Json<Login>) -> actix_web::Result<impl Responder> {
    let hashed_password = &Sha256::digest(format!("{}:{}", credentials.password, credentials.username))[..];

    let Some(user) = User::find()
        .filter(user::Column::Username.eq(&credentials.username))
        .filter(user::Column::Password.eq(hashed_password))
        .one(db.get_ref()).await
        .map_err(|err| {
            tracing::error!(error = %err, "failed to look up user");
            actix_web::error::ErrorServiceUnavailable("unable to reach user store")
        })?
    else {
        return Err(actix_web::error::ErrorForbidden("invalid credentials"));
    };

    let session = session_of(&user)?;
    tracing::info!(user_id = %session.user_id, tenant_id = %session.tenant_id, "login");

    Ok(authority.issue_for(&session)?)
}

#[get("")]
async fn whoami(session: Session) -> impl Responder {
    web::Json(session)
}
