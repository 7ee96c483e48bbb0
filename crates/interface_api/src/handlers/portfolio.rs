//! Payment schedule and portfolio handlers

use axum::{
    extract::{Query, State},
    Json,
};

use domain_investment::{PaymentSchedule, PortfolioSummary};

use crate::auth::AuthUser;
use crate::dto::schedule::ScheduleQuery;
use crate::dto::ApiResponse;
use crate::{error::ApiError, AppState};

/// The caller's payment schedule across open investments
pub async fn get_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ApiResponse<PaymentSchedule>>, ApiError> {
    let filter = query.to_filter()?;
    let schedule = state.schedules.get_schedule(user.user_id, filter).await?;
    Ok(ApiResponse::ok("Payment schedule retrieved", schedule))
}

pub async fn get_portfolio(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<PortfolioSummary>>, ApiError> {
    let summary = state.investments.portfolio_summary(user.user_id).await?;
    Ok(ApiResponse::ok("Portfolio retrieved", summary))
}
