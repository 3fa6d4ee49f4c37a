use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{authorize, Operation};
use crate::database::{Org, Status};
use crate::middleware::{ApiResponse, ApiResult, Authenticated};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrgRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: String,
}

/// Administrative org changes; `op` selects the field
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UpdateOrgRequest {
    Owner { owner: String },
    Status { status: Status },
}

pub fn location(id: &str) -> String {
    format!("/api/v0/org/{id}")
}

/// POST /api/v0/org - Create an unconfirmed org (root only)
pub async fn org_post(
    State(state): State<AppState>,
    auth: Authenticated,
    payload: Result<Json<CreateOrgRequest>, JsonRejection>,
) -> ApiResult<Created> {
    authorize(&auth.session, &Operation::CreateOrg)?;
    let Json(request) = payload?;

    let mut org = Org::new(&request.name)?;
    org.insert(state.store.writer()).await?;

    info!(org_id = %org.id, by = %auth.session.user.id, "Created org");
    Ok(ApiResponse::created(location(&org.id), Created { id: org.id }))
}

/// GET /api/v0/org/:id
pub async fn org_get(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> ApiResult<Org> {
    authorize(&auth.session, &Operation::ReadOrg { org: &id })?;

    if id == auth.session.org.id {
        return Ok(ApiResponse::success(auth.session.org));
    }
    let org = Org::read(state.store.random_replica(), &id).await?;
    Ok(ApiResponse::success(org))
}

/// PUT /api/v0/org/:id - Change owner or status (root only)
///
/// Body: `{"op": "owner", "owner": "<user id>"}` or `{"op": "status", "status": 2}`
pub async fn org_put(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrgRequest>, JsonRejection>,
) -> ApiResult<()> {
    authorize(&auth.session, &Operation::UpdateOrg { org: &id })?;
    let Json(request) = payload?;

    let writer = state.store.writer();
    let mut org = Org::read(writer, &id).await?;

    match request {
        UpdateOrgRequest::Owner { owner } => {
            org.update_owner(writer, &owner).await?;
            info!(org_id = %org.id, owner = %owner, "Changed org owner");
        }
        UpdateOrgRequest::Status { status } => {
            org.update_status(writer, status).await?;
            info!(org_id = %org.id, status = status.as_i64(), "Changed org status");
        }
    }

    Ok(ApiResponse::no_content())
}
