/// Company directory endpoints
///
/// All routes require a token. Unpublished companies are visible only to
/// their owner and admins; changes need the owner or an admin.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cluster_shared::{
    auth::{
        authorization::{can_view_company, require_owner_or_admin},
        middleware::AuthContext,
    },
    models::company::{Company, CompanySector, CreateCompany, UpdateCompany},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct CompanyQuery {
    pub sector: Option<CompanySector>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub message: String,
    pub is_published: bool,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Company not found".to_string())
}

/// Loads a company the caller may change
async fn load_for_change(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Company> {
    let company = Company::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    require_owner_or_admin(auth, company.owner_id)?;
    Ok(company)
}

/// `POST /api/companies`
pub async fn create_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateCompany>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    req.validate()?;

    if Company::find_by_owner(&state.db, auth.user_id).await?.is_some() {
        return Err(ApiError::Conflict(
            "You already have a registered company".to_string(),
        ));
    }

    let company = Company::create(&state.db, auth.user_id, req).await?;
    tracing::info!(company_id = %company.id, owner_id = %auth.user_id, "Company created");

    Ok((StatusCode::CREATED, Json(company)))
}

/// `GET /api/companies?sector=`
///
/// Members see published companies only; admins see all.
pub async fn list_companies(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<CompanyQuery>,
) -> ApiResult<Json<Vec<Company>>> {
    let companies = Company::list(&state.db, query.sector, !auth.is_admin()).await?;
    Ok(Json(companies))
}

/// `GET /api/companies/:id`
pub async fn get_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Company>> {
    let company = Company::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    if !can_view_company(&auth, &company) {
        return Err(ApiError::Forbidden(
            "You do not have permission to view this company".to_string(),
        ));
    }

    Ok(Json(company))
}

/// `PUT /api/companies/:id`
pub async fn update_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<UpdateCompany>,
) -> ApiResult<Json<Company>> {
    patch.validate()?;
    load_for_change(&state, &auth, id).await?;

    let company = Company::update(&state.db, id, patch)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(company_id = %id, user_id = %auth.user_id, "Company updated");
    Ok(Json(company))
}

/// `DELETE /api/companies/:id`
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    load_for_change(&state, &auth, id).await?;

    if !Company::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(company_id = %id, user_id = %auth.user_id, "Company deleted");
    Ok(Json(json!({ "message": "Company deleted successfully" })))
}

/// `PUT /api/companies/:id/publish`
pub async fn toggle_publish(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PublishResponse>> {
    load_for_change(&state, &auth, id).await?;

    let company = Company::toggle_publish(&state.db, id)
        .await?
        .ok_or_else(not_found)?;

    let message = if company.is_published {
        "Company published successfully"
    } else {
        "Company unpublished successfully"
    };

    Ok(Json(PublishResponse {
        message: message.to_string(),
        is_published: company.is_published,
    }))
}
