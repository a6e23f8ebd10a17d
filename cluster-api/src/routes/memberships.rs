/// Membership ledger endpoints
///
/// `apply` and `me` are open to any authenticated user; everything else is
/// admin-only (enforced by the router's admin gate). Approval and renewal
/// emails are sent after the change commits, and a failed send never
/// fails the request.

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
use chrono::{DateTime, Utc};
use cluster_shared::{
    auth::middleware::AuthContext,
    lifecycle::{LifecycleError, DEFAULT_MEMBERSHIP_LEVEL},
    models::{
        company::{not_blank, Company},
        membership::{
            Membership, MembershipDetail, MembershipFilter, MembershipRecipient, MembershipStatus,
            NewMembership, NewPayment, PaymentStatus,
        },
    },
    reminders::{send_renewal_reminders as run_reminder_sweep, ReminderScope, ReminderSummary},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplyRequest {
    #[validate(custom(function = "not_blank", message = "Membership level cannot be empty"))]
    pub membership_level: Option<String>,

    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: MembershipStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRequest {
    pub amount: f64,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Payment description is required"))]
    pub description: String,

    pub date: Option<DateTime<Utc>>,
}

/// `{message, membership}` returned by every admin mutation
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub message: String,
    pub membership: Membership,
}

impl MembershipResponse {
    fn new(message: &str, membership: Membership) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
            membership,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub message: String,
    pub total_memberships: usize,
    pub sent: usize,
}

impl From<ReminderSummary> for ReminderResponse {
    fn from(summary: ReminderSummary) -> Self {
        Self {
            message: summary.message(),
            total_memberships: summary.total_memberships,
            sent: summary.sent,
        }
    }
}

/// Looks up who to email about a membership; `None` is logged and skipped
async fn recipient(state: &AppState, id: Uuid) -> Option<MembershipRecipient> {
    match Membership::recipient(&state.db, id).await {
        Ok(found) => found,
        Err(e) => {
            tracing::error!(membership_id = %id, error = %e, "Failed to load email recipient");
            None
        }
    }
}

/// `POST /api/memberships/apply`
pub async fn apply(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<ApplyRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    req.validate()?;

    let company = Company::find_by_owner(&state.db, auth.user_id)
        .await?
        .ok_or(LifecycleError::CompanyRequired)?;

    let membership = Membership::apply(
        &state.db,
        NewMembership {
            user_id: auth.user_id,
            company_id: company.id,
            membership_level: req
                .membership_level
                .map(|level| level.trim().to_string())
                .unwrap_or_else(|| DEFAULT_MEMBERSHIP_LEVEL.to_string()),
            start_date: req.start_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(membership)))
}

/// `GET /api/memberships/me`
pub async fn current_membership(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MembershipDetail>> {
    let detail = Membership::current_for_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("You do not have a registered membership".to_string()))?;

    Ok(Json(detail))
}

/// `GET /api/memberships?status=&paymentStatus=`
pub async fn list_memberships(
    State(state): State<AppState>,
    Query(filter): Query<MembershipFilter>,
) -> ApiResult<Json<Vec<MembershipDetail>>> {
    Ok(Json(Membership::list(&state.db, &filter).await?))
}

/// `GET /api/memberships/pending`
pub async fn list_pending(State(state): State<AppState>) -> ApiResult<Json<Vec<MembershipDetail>>> {
    Ok(Json(Membership::list_pending(&state.db).await?))
}

/// `PUT /api/memberships/:id/approve`
pub async fn approve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MembershipResponse>> {
    let membership = Membership::approve(&state.db, id).await?;
    tracing::info!(membership_id = %id, admin_id = %auth.user_id, "Approved by admin");

    if let Some(to) = recipient(&state, id).await {
        let message = state.notifier.templates().membership_approved(
            &to.email,
            &to.first_name,
            &to.company_name,
        );
        state.notifier.notify(message).await;
    }

    Ok(MembershipResponse::new("Membership approved successfully", membership))
}

/// `PUT /api/memberships/:id/reject`
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MembershipResponse>> {
    let membership = Membership::reject(&state.db, id).await?;
    Ok(MembershipResponse::new("Membership rejected successfully", membership))
}

/// `PUT /api/memberships/:id/renew`
pub async fn renew(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MembershipResponse>> {
    let membership = Membership::renew(&state.db, id).await?;

    if let Some(to) = recipient(&state, id).await {
        let message = state.notifier.templates().membership_renewed(
            &to.email,
            &to.first_name,
            &to.company_name,
            membership.renewal_date,
        );
        state.notifier.notify(message).await;
    }

    Ok(MembershipResponse::new("Membership renewed successfully", membership))
}

/// `PUT /api/memberships/:id/status`
///
/// Any status may be set from any other.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let membership = Membership::set_status(&state.db, id, req.status).await?;
    Ok(MembershipResponse::new("Membership status updated successfully", membership))
}

/// `PUT /api/memberships/:id/payment-status`
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<PaymentStatusRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let membership = Membership::set_payment_status(&state.db, id, req.payment_status).await?;
    Ok(MembershipResponse::new("Payment status updated successfully", membership))
}

/// `POST /api/memberships/:id/payment`
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<PaymentRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    req.validate()?;

    let membership = Membership::record_payment(
        &state.db,
        id,
        NewPayment {
            amount: req.amount,
            description: req.description.trim().to_string(),
            date: req.date,
        },
    )
    .await?;

    Ok(MembershipResponse::new("Payment recorded successfully", membership))
}

/// `POST /api/memberships/send-renewal-reminders`
///
/// Reminds every due member, including those the worker already reached.
pub async fn send_renewal_reminders(
    State(state): State<AppState>,
) -> ApiResult<Json<ReminderResponse>> {
    let summary =
        run_reminder_sweep(&state.db, &state.notifier, Utc::now(), ReminderScope::AllDue).await?;
    Ok(Json(summary.into()))
}
