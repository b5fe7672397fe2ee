//! Manual-testing endpoints: row counts, raw assignments, status overrides
//! and the driver visibility check.

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    response::Json,
};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use shared::visibility::{driver_region, is_visible_to_driver};

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::leads::find_lead;
use crate::models::TruckAssignment;
use crate::schema::{districts, drivers, leads, products, truck_assignments};

const ASSIGNMENT_CAP: i64 = 200;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub leads: i64,
    pub truck_assignments: i64,
    pub drivers: i64,
    pub districts: i64,
    pub products: i64,
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let mut conn = state.pool.get().await?;

    Ok(Json(StatsResponse {
        leads: leads::table.count().get_result(&mut conn).await?,
        truck_assignments: truck_assignments::table.count().get_result(&mut conn).await?,
        drivers: drivers::table.count().get_result(&mut conn).await?,
        districts: districts::table.count().get_result(&mut conn).await?,
        products: products::table.count().get_result(&mut conn).await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AssignmentsQuery {
    pub date: Option<NaiveDate>,
}

pub async fn list_assignments(
    State(state): State<AppState>,
    query: Result<Query<AssignmentsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TruckAssignment>>> {
    let Query(query) = query?;
    let mut conn = state.pool.get().await?;

    let mut select = truck_assignments::table
        .order(truck_assignments::assigned_at.desc())
        .limit(ASSIGNMENT_CAP)
        .into_boxed();
    if let Some(date) = query.date {
        select = select.filter(truck_assignments::delivery_date.eq(date));
    }

    Ok(Json(select.load::<TruckAssignment>(&mut conn).await?))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub lead_id: Option<i64>,
    pub delivery_date: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Overwrites an assignment's status. Any non-blank value is accepted.
pub async fn set_assignment_status(
    State(state): State<AppState>,
    payload: Result<Json<SetStatusRequest>, JsonRejection>,
) -> ApiResult<Json<TruckAssignment>> {
    let Json(request) = payload?;
    let lead_id = request.lead_id.ok_or_else(|| ApiError::missing("lead_id"))?;
    let delivery_date = request.delivery_date.ok_or_else(|| ApiError::missing("delivery_date"))?;
    let status = request
        .status
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::missing("status"))?;

    let mut conn = state.pool.get().await?;
    let assignment = set_status(&mut conn, lead_id, delivery_date, &status).await?;

    tracing::info!("Debug: status of lead {} on {} set to {:?}", lead_id, delivery_date, status);
    Ok(Json(assignment))
}

pub async fn set_status(
    conn: &mut AsyncPgConnection,
    lead_id: i64,
    delivery_date: NaiveDate,
    status: &str,
) -> ApiResult<TruckAssignment> {
    diesel::update(
        truck_assignments::table
            .filter(truck_assignments::lead_id.eq(lead_id))
            .filter(truck_assignments::delivery_date.eq(delivery_date)),
    )
    .set(truck_assignments::status.eq(status))
    .get_result::<TruckAssignment>(conn)
    .await
    .optional()?
    .ok_or_else(|| ApiError::not_found(format!("No assignment for lead {} on {}", lead_id, delivery_date)))
}

#[derive(Debug, Deserialize)]
pub struct VisibilityQuery {
    pub driver_id: Option<i32>,
    pub lead_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub driver_id: i32,
    pub lead_id: i64,
    pub date: Option<NaiveDate>,
    pub driver_region: Option<&'static str>,
    pub lead_region: Option<String>,
    pub status: Option<String>,
    pub visible: bool,
}

pub async fn check_visibility(
    State(state): State<AppState>,
    query: Result<Query<VisibilityQuery>, QueryRejection>,
) -> ApiResult<Json<VisibilityResponse>> {
    let Query(query) = query?;
    let driver_id = query.driver_id.ok_or_else(|| ApiError::missing("driver_id"))?;
    let lead_id = query.lead_id.ok_or_else(|| ApiError::missing("lead_id"))?;

    let mut conn = state.pool.get().await?;
    let lead = find_lead(&mut conn, lead_id).await?;
    let date = query.date.or(lead.delivery_date);

    let status = match date {
        Some(date) => {
            truck_assignments::table
                .filter(truck_assignments::lead_id.eq(lead_id))
                .filter(truck_assignments::delivery_date.eq(date))
                .select(truck_assignments::status)
                .first::<String>(&mut conn)
                .await
                .optional()?
        }
        None => None,
    };

    let lead_region = lead.lead_info().region;
    let visible = is_visible_to_driver(driver_id, lead_region.as_deref(), status.as_deref());

    Ok(Json(VisibilityResponse {
        driver_id,
        lead_id,
        date,
        driver_region: driver_region(driver_id),
        lead_region,
        status,
        visible,
    }))
}
