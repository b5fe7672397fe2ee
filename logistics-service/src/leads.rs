use axum::{
    extract::{rejection::{PathRejection, QueryRejection}, Path, Query, State},
    response::Json,
};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::Lead;
use crate::schema::leads;

const LIST_CAP: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct LeadListQuery {
    pub date: Option<NaiveDate>,
}

pub async fn list_leads(
    State(state): State<AppState>,
    query: Result<Query<LeadListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Lead>>> {
    let Query(query) = query?;
    let mut conn = state.pool.get().await?;

    let rows = match query.date {
        Some(date) => leads_for_date(&mut conn, date).await?,
        None => {
            leads::table
                .order(leads::created_at.desc())
                .limit(LIST_CAP)
                .load::<Lead>(&mut conn)
                .await?
        }
    };

    Ok(Json(rows))
}

pub async fn get_lead(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Lead>> {
    let Path(id) = id?;
    let mut conn = state.pool.get().await?;

    Ok(Json(find_lead(&mut conn, id).await?))
}

/// Leads delivering on `date`, oldest first.
pub async fn leads_for_date(conn: &mut AsyncPgConnection, date: NaiveDate) -> QueryResult<Vec<Lead>> {
    leads::table
        .filter(leads::delivery_date.eq(date))
        .order((leads::created_at.asc(), leads::id.asc()))
        .load::<Lead>(conn)
        .await
}

pub async fn find_lead(conn: &mut AsyncPgConnection, id: i64) -> ApiResult<Lead> {
    leads::table
        .find(id)
        .first::<Lead>(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Lead {} not found", id)))
}
