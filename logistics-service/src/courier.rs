//! Delivery list for the courier page.

use axum::{
    extract::{rejection::{PathRejection, QueryRejection}, Path, Query, State},
    response::Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::visibility::{driver_region, is_visible_to_driver};
use std::collections::HashMap;

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::leads::leads_for_date;
use crate::models::{Lead, TruckAssignment};
use crate::trucks::assignments_for_date;

#[derive(Debug, Deserialize)]
pub struct CourierQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct CourierOrder {
    pub lead_id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub delivery_address: Option<String>,
    pub region: Option<String>,
    pub delivery_time: Option<String>,
    pub products: serde_json::Value,
    pub assignment: Option<TruckAssignment>,
}

#[derive(Debug, Serialize)]
pub struct CourierOrdersResponse {
    pub driver_id: i32,
    pub region: &'static str,
    pub date: NaiveDate,
    pub orders: Vec<CourierOrder>,
}

/// Leads a driver should see, paired with their assignment if any.
pub fn visible_orders(
    driver_id: i32,
    leads: Vec<Lead>,
    assignments: Vec<TruckAssignment>,
) -> Vec<CourierOrder> {
    let mut by_lead: HashMap<i64, TruckAssignment> =
        assignments.into_iter().map(|a| (a.lead_id, a)).collect();

    leads
        .into_iter()
        .filter_map(|lead| {
            let info = lead.lead_info();
            let assignment = by_lead.remove(&lead.id);
            let status = assignment.as_ref().map(|a| a.status.as_str());
            if !is_visible_to_driver(driver_id, info.region.as_deref(), status) {
                return None;
            }

            Some(CourierOrder {
                lead_id: lead.id,
                name: info.name,
                phone: info.phone,
                delivery_address: info.delivery_address,
                region: info.region,
                delivery_time: assignment
                    .as_ref()
                    .and_then(|a| a.delivery_time.clone())
                    .or(lead.delivery_time),
                products: lead.products,
                assignment,
            })
        })
        .collect()
}

pub async fn driver_orders(
    State(state): State<AppState>,
    driver_id: Result<Path<i32>, PathRejection>,
    query: Result<Query<CourierQuery>, QueryRejection>,
) -> ApiResult<Json<CourierOrdersResponse>> {
    let Path(driver_id) = driver_id?;
    let Query(query) = query?;
    let region = driver_region(driver_id)
        .ok_or_else(|| ApiError::not_found(format!("Driver {} has no delivery region", driver_id)))?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let mut conn = state.pool.get().await?;
    let leads = leads_for_date(&mut conn, date).await?;
    let assignments = assignments_for_date(&mut conn, date).await?;

    Ok(Json(CourierOrdersResponse {
        driver_id,
        region,
        date,
        orders: visible_orders(driver_id, leads, assignments),
    }))
}
