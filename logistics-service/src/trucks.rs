use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::dsl::sql;
use diesel::sql_types::Bool;
use diesel::upsert::excluded;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use shared::AssignmentStatus;

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::leads::find_lead;
use crate::models::{NewTruckAssignment, TruckAssignment};
use crate::schema::truck_assignments;

#[derive(Debug, Deserialize)]
pub struct AssignTruckRequest {
    pub lead_id: Option<i64>,
    pub delivery_date: Option<NaiveDate>,
    pub truck_name: Option<String>,
    pub delivery_time: Option<String>,
    pub assigned_by: Option<String>,
    pub notes: Option<String>,
}

impl AssignTruckRequest {
    pub fn into_new_assignment(self) -> ApiResult<NewTruckAssignment> {
        let lead_id = self.lead_id.ok_or_else(|| ApiError::missing("lead_id"))?;
        let delivery_date = self.delivery_date.ok_or_else(|| ApiError::missing("delivery_date"))?;
        let truck_name = non_blank(self.truck_name).ok_or_else(|| ApiError::missing("truck_name"))?;

        Ok(NewTruckAssignment {
            lead_id,
            delivery_date,
            truck_name,
            delivery_time: non_blank(self.delivery_time),
            status: AssignmentStatus::PENDING.to_string(),
            assigned_by: non_blank(self.assigned_by),
            assigned_at: Utc::now(),
            notes: non_blank(self.notes),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
pub struct AssignTruckResponse {
    pub assignment: TruckAssignment,
    pub created: bool,
}

pub async fn assign_truck(
    State(state): State<AppState>,
    payload: Result<Json<AssignTruckRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AssignTruckResponse>)> {
    let Json(request) = payload?;
    let new_assignment = request.into_new_assignment()?;

    let mut conn = state.pool.get().await?;
    let (assignment, created) = upsert_assignment(&mut conn, new_assignment).await?;

    tracing::info!(
        "{} truck {} for lead {} on {}",
        if created { "Assigned" } else { "Reassigned" },
        assignment.truck_name,
        assignment.lead_id,
        assignment.delivery_date
    );

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(AssignTruckResponse { assignment, created })))
}

/// Inserts or overwrites the assignment for `(lead_id, delivery_date)`.
///
/// The unique key makes concurrent identical requests converge on one row.
/// Status is only set on insert; reassigning a truck keeps the current one.
pub async fn upsert_assignment(
    conn: &mut AsyncPgConnection,
    new_assignment: NewTruckAssignment,
) -> ApiResult<(TruckAssignment, bool)> {
    conn.transaction::<_, ApiError, _>(|conn| {
        Box::pin(async move {
            find_lead(conn, new_assignment.lead_id).await?;

            let (assignment, created) = diesel::insert_into(truck_assignments::table)
                .values(&new_assignment)
                .on_conflict((truck_assignments::lead_id, truck_assignments::delivery_date))
                .do_update()
                .set((
                    truck_assignments::truck_name.eq(excluded(truck_assignments::truck_name)),
                    truck_assignments::delivery_time.eq(excluded(truck_assignments::delivery_time)),
                    truck_assignments::assigned_by.eq(excluded(truck_assignments::assigned_by)),
                    truck_assignments::assigned_at.eq(excluded(truck_assignments::assigned_at)),
                    truck_assignments::notes.eq(excluded(truck_assignments::notes)),
                ))
                // `xmax` is zero only on a freshly inserted row version.
                .returning((truck_assignments::all_columns, sql::<Bool>("xmax = 0")))
                .get_result::<(TruckAssignment, bool)>(conn)
                .await?;

            Ok((assignment, created))
        })
    })
    .await
}

#[derive(Debug, Deserialize)]
pub struct AssignmentListQuery {
    pub date: Option<NaiveDate>,
}

pub async fn list_assignments(
    State(state): State<AppState>,
    query: Result<Query<AssignmentListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TruckAssignment>>> {
    let Query(query) = query?;
    let date = query.date.ok_or_else(|| ApiError::missing("date"))?;

    let mut conn = state.pool.get().await?;
    Ok(Json(assignments_for_date(&mut conn, date).await?))
}

pub async fn assignments_for_date(
    conn: &mut AsyncPgConnection,
    date: NaiveDate,
) -> QueryResult<Vec<TruckAssignment>> {
    truck_assignments::table
        .filter(truck_assignments::delivery_date.eq(date))
        .order((truck_assignments::truck_name.asc(), truck_assignments::lead_id.asc()))
        .load::<TruckAssignment>(conn)
        .await
}
