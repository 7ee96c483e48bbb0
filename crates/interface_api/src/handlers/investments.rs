//! Investment handlers
//!
//! Every route acts on the caller's own investments.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::{InstallmentId, InvestmentId, PropertyId};

use crate::auth::AuthUser;
use crate::dto::investment::*;
use crate::dto::{ApiResponse, ValidatedJson};
use crate::{error::ApiError, AppState};

/// Buys shares of a property
pub async fn create_investment(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateInvestmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InvestmentResponse>>), ApiError> {
    let investment = state
        .investments
        .create_investment(user.user_id, PropertyId::from(request.property_id), request.shares)
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Investment created", InvestmentResponse::from(investment)),
    ))
}

/// Lists the caller's investments, cancelled ones included
pub async fn list_investments(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<InvestmentResponse>>>, ApiError> {
    let investments = state.investments.list_user_investments(user.user_id).await?;
    let data = investments.into_iter().map(InvestmentResponse::from).collect();
    Ok(ApiResponse::ok("Investments retrieved", data))
}

pub async fn get_investment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InvestmentResponse>>, ApiError> {
    let investment = state
        .investments
        .get_investment(user.user_id, InvestmentId::from(id))
        .await?;
    Ok(ApiResponse::ok("Investment retrieved", InvestmentResponse::from(investment)))
}

/// Records the down payment after a completed gateway charge
pub async fn pay_down_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<PaymentRequest>,
) -> Result<Json<ApiResponse<InvestmentResponse>>, ApiError> {
    let investment = state
        .investments
        .pay_down_payment(user.user_id, InvestmentId::from(id), request.into())
        .await?;
    Ok(ApiResponse::ok("Down payment recorded", InvestmentResponse::from(investment)))
}

/// Records payment of one installment after a completed gateway charge
pub async fn pay_installment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, installment_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(request): ValidatedJson<PaymentRequest>,
) -> Result<Json<ApiResponse<InvestmentResponse>>, ApiError> {
    let investment = state
        .investments
        .pay_installment(
            user.user_id,
            InvestmentId::from(id),
            InstallmentId::from(installment_id),
            request.into(),
        )
        .await?;
    Ok(ApiResponse::ok("Installment paid", InvestmentResponse::from(investment)))
}

/// Cancels an unpaid pending investment
pub async fn cancel_investment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InvestmentResponse>>, ApiError> {
    let investment = state
        .investments
        .cancel_investment(user.user_id, InvestmentId::from(id))
        .await?;
    Ok(ApiResponse::ok("Investment cancelled", InvestmentResponse::from(investment)))
}
