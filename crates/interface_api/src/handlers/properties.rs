//! Property handlers
//!
//! Reads are open to any authenticated caller; writes need
//! `property:write`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::PropertyId;
use domain_investment::ActivationReport;

use crate::auth::{permissions, AuthUser};
use crate::dto::property::*;
use crate::dto::{ApiResponse, ValidatedJson};
use crate::{error::ApiError, AppState};

/// Registers a property
pub async fn register_property(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PropertyResponse>>), ApiError> {
    user.require(permissions::PROPERTY_WRITE)?;
    let property = state.investments.register_property(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Property registered", PropertyResponse::from(&property)),
    ))
}

/// Gets a property with its current inventory and share terms
pub async fn get_property(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PropertyResponse>>, ApiError> {
    let property = state.investments.get_property(PropertyId::from(id)).await?;
    Ok(ApiResponse::ok("Property retrieved", PropertyResponse::from(&property)))
}

/// Recomputes share terms from new financial terms
pub async fn update_terms(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateTermsRequest>,
) -> Result<Json<ApiResponse<PropertyResponse>>, ApiError> {
    user.require(permissions::PROPERTY_WRITE)?;
    let property_id = PropertyId::from(id);
    let currency = state.investments.get_property(property_id).await?.currency();
    let property = state
        .investments
        .recompute_property_terms(property_id, request.into_update(currency))
        .await?;
    Ok(ApiResponse::ok("Property terms updated", PropertyResponse::from(&property)))
}

/// Moves a funded property to its next status
pub async fn advance_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AdvanceStatusRequest>,
) -> Result<Json<ApiResponse<PropertyResponse>>, ApiError> {
    user.require(permissions::PROPERTY_WRITE)?;
    let property = state
        .investments
        .advance_property_status(PropertyId::from(id), request.status)
        .await?;
    Ok(ApiResponse::ok("Property status updated", PropertyResponse::from(&property)))
}

/// Starts the schedules of pending investments on a funded property
pub async fn activate_schedules(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ActivationReport>>, ApiError> {
    user.require(permissions::PROPERTY_WRITE)?;
    let report = state
        .investments
        .activate_property_schedules(PropertyId::from(id))
        .await?;
    Ok(ApiResponse::ok("Schedules activated", report))
}
