use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use sqlx::AnyPool;
use tracing::info;

use super::org::Created;
use crate::auth::{authorize, can_perform, Decision, Operation, PrivilegeLevel, Session};
use crate::database::{ModelError, Status, User, UserView};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Authenticated};
use crate::security::safe_str;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub display_name: String,
    pub email: String,
    pub org: String,
    pub password: String,
}

/// Administrative user changes
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UpdateUserRequest {
    DisplayName { display_name: String },
    Password { password: String },
    Status { status: Status },
}

/// Changes any active user may make to themselves
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SelfUpdateRequest {
    DisplayName { display_name: String },
    Password { password: String },
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    Update,
}

impl Access {
    fn operation<'a>(self, user: &'a str, org: Option<&'a str>) -> Operation<'a> {
        match self {
            Access::Read => Operation::ReadUser { user, org },
            Access::Update => Operation::UpdateUser { user, org },
        }
    }
}

pub fn location(id: &str) -> String {
    format!("/api/v0/user/{id}")
}

/// Plaintext password in, derived credential out
fn derive(state: &AppState, password: &str) -> Result<String, ApiError> {
    if !safe_str(password) {
        return Err(ModelError::Malformed("password").into());
    }
    Ok(state.codec.derive_password(password)?)
}

/// Load `id` if the session may touch it.
///
/// Org owners are only decided once the target's org is known. Until then
/// a missing target answers Forbidden, the same as one in another org.
async fn load_visible(
    state: &AppState,
    pool: &AnyPool,
    session: &Session,
    id: &str,
    access: Access,
) -> Result<User, ApiError> {
    match can_perform(session, &access.operation(id, None)) {
        Decision::Allow if id == session.user.id => Ok(session.user.clone()),
        Decision::Allow => Ok(User::read(pool, &state.codec, id).await?),
        Decision::Deny if session.privilege == PrivilegeLevel::Org => {
            let user = match User::read(pool, &state.codec, id).await {
                Ok(user) => user,
                Err(ModelError::NotFound) => return Err(ApiError::forbidden("Forbidden")),
                Err(e) => return Err(e.into()),
            };
            authorize(session, &access.operation(id, Some(&user.org)))?;
            Ok(user)
        }
        Decision::Deny => Err(ApiError::forbidden("Forbidden")),
    }
}

/// POST /api/v0/user - Create an unconfirmed user
///
/// Body: `{"display_name": .., "email": .., "org": .., "password": ..}`
pub async fn user_post(
    State(state): State<AppState>,
    auth: Authenticated,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<Created> {
    let Json(request) = payload?;
    authorize(&auth.session, &Operation::CreateUser { org: &request.org })?;

    let password = derive(&state, &request.password)?;
    let mut user = User::new(
        &state.codec,
        &request.display_name,
        &request.email,
        &request.org,
        &password,
    )?;
    user.insert(state.store.writer()).await?;

    info!(user_id = %user.id, org_id = %user.org, by = %auth.session.user.id, "Created user");
    Ok(ApiResponse::created(location(&user.id), Created { id: user.id }))
}

/// GET /api/v0/user/:id - Read a user without secrets
pub async fn user_get(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> ApiResult<UserView> {
    let user = load_visible(&state, state.store.random_replica(), &auth.session, &id, Access::Read).await?;
    Ok(ApiResponse::success(user.redacted()))
}

/// PUT /api/v0/user/:id - Administrative update
///
/// Body: `{"op": "display_name" | "password" | "status", ..}`
pub async fn user_put(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<()> {
    let writer = state.store.writer();
    let mut user = load_visible(&state, writer, &auth.session, &id, Access::Update).await?;
    let Json(request) = payload?;

    match request {
        UpdateUserRequest::DisplayName { display_name } => {
            user.update_display_name(writer, &state.codec, &display_name).await?;
        }
        UpdateUserRequest::Password { password } => {
            let derived = derive(&state, &password)?;
            user.update_password(writer, &derived).await?;
        }
        UpdateUserRequest::Status { status } => {
            user.update_status(writer, status).await?;
        }
    }

    info!(user_id = %user.id, by = %auth.session.user.id, "Updated user");
    Ok(ApiResponse::no_content())
}

/// PUT /api/v0/self - Caller updates their own display name or password
pub async fn self_put(
    State(state): State<AppState>,
    auth: Authenticated,
    payload: Result<Json<SelfUpdateRequest>, JsonRejection>,
) -> ApiResult<()> {
    authorize(&auth.session, &Operation::UpdateSelf)?;
    let Json(request) = payload?;

    let writer = state.store.writer();
    let mut user = auth.session.user;

    match request {
        SelfUpdateRequest::DisplayName { display_name } => {
            user.update_display_name(writer, &state.codec, &display_name).await?;
        }
        SelfUpdateRequest::Password { password } => {
            let derived = derive(&state, &password)?;
            user.update_password(writer, &derived).await?;
        }
    }

    info!(user_id = %user.id, "Updated self");
    Ok(ApiResponse::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_bodies() {
        let r: UpdateUserRequest =
            serde_json::from_str(r#"{"op":"display_name","display_name":"Bo"}"#).unwrap();
        assert!(matches!(r, UpdateUserRequest::DisplayName { display_name } if display_name == "Bo"));

        let r: UpdateUserRequest = serde_json::from_str(r#"{"op":"status","status":1}"#).unwrap();
        assert!(matches!(r, UpdateUserRequest::Status { status: Status::Active }));

        // status is not a self-service field
        assert!(serde_json::from_str::<SelfUpdateRequest>(r#"{"op":"status","status":1}"#).is_err());
        let r: SelfUpdateRequest = serde_json::from_str(r#"{"op":"password","password":"pw"}"#).unwrap();
        assert!(matches!(r, SelfUpdateRequest::Password { .. }));
    }

    #[test]
    fn access_maps_to_operations() {
        assert_eq!(
            Access::Read.operation("u", Some("o")),
            Operation::ReadUser { user: "u", org: Some("o") }
        );
        assert_eq!(
            Access::Update.operation("u", None),
            Operation::UpdateUser { user: "u", org: None }
        );
    }
}
