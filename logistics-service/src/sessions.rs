use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    response::Json,
};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewProductionSession, ProductionSession};
use crate::schema::production_sessions;

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub date: NaiveDate,
    pub time_slot: String,
    pub produced_units: i32,
    pub available_bottles: i32,
    pub notes: Option<String>,
    /// False when no row exists yet and the counters are defaults.
    pub persisted: bool,
}

impl From<ProductionSession> for SessionResponse {
    fn from(session: ProductionSession) -> Self {
        Self {
            date: session.session_date,
            time_slot: session.time_slot,
            produced_units: session.produced_units,
            available_bottles: session.available_bottles,
            notes: session.notes,
            persisted: true,
        }
    }
}

impl SessionResponse {
    fn empty(date: NaiveDate, time_slot: String) -> Self {
        Self {
            date,
            time_slot,
            produced_units: 0,
            available_bottles: 0,
            notes: None,
            persisted: false,
        }
    }
}

fn required_slot(time_slot: Option<String>) -> ApiResult<String> {
    time_slot
        .map(|slot| slot.trim().to_string())
        .filter(|slot| !slot.is_empty())
        .ok_or_else(|| ApiError::missing("time_slot"))
}

pub async fn get_session(
    State(state): State<AppState>,
    query: Result<Query<SessionQuery>, QueryRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Query(query) = query?;
    let date = query.date.ok_or_else(|| ApiError::missing("date"))?;
    let time_slot = required_slot(query.time_slot)?;

    let mut conn = state.pool.get().await?;
    let session = production_sessions::table
        .filter(production_sessions::session_date.eq(date))
        .filter(production_sessions::time_slot.eq(&time_slot))
        .first::<ProductionSession>(&mut conn)
        .await
        .optional()?;

    Ok(Json(match session {
        Some(session) => session.into(),
        None => SessionResponse::empty(date, time_slot),
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpsertSessionRequest {
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub produced_units: Option<i32>,
    pub available_bottles: Option<i32>,
    pub notes: Option<String>,
}

impl UpsertSessionRequest {
    pub fn into_new_session(self) -> ApiResult<NewProductionSession> {
        let session_date = self.date.ok_or_else(|| ApiError::missing("date"))?;
        let time_slot = required_slot(self.time_slot)?;
        let produced_units = self.produced_units.unwrap_or(0);
        let available_bottles = self.available_bottles.unwrap_or(0);

        if produced_units < 0 || available_bottles < 0 {
            return Err(ApiError::bad_request("Counters must not be negative"));
        }

        Ok(NewProductionSession {
            session_date,
            time_slot,
            produced_units,
            available_bottles,
            notes: self.notes,
            updated_at: Utc::now(),
        })
    }
}

pub async fn upsert_session(
    State(state): State<AppState>,
    payload: Result<Json<UpsertSessionRequest>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let Json(request) = payload?;
    let new_session = request.into_new_session()?;

    let mut conn = state.pool.get().await?;
    let session = save_session(&mut conn, &new_session).await?;

    tracing::info!(
        "Production session {} {}: produced {}, bottles {}",
        session.session_date,
        session.time_slot,
        session.produced_units,
        session.available_bottles
    );
    Ok(Json(session.into()))
}

pub async fn save_session(
    conn: &mut AsyncPgConnection,
    new_session: &NewProductionSession,
) -> QueryResult<ProductionSession> {
    diesel::insert_into(production_sessions::table)
        .values(new_session)
        .on_conflict((production_sessions::session_date, production_sessions::time_slot))
        .do_update()
        .set((
            production_sessions::produced_units.eq(excluded(production_sessions::produced_units)),
            production_sessions::available_bottles.eq(excluded(production_sessions::available_bottles)),
            production_sessions::notes.eq(excluded(production_sessions::notes)),
            production_sessions::updated_at.eq(excluded(production_sessions::updated_at)),
        ))
        .get_result::<ProductionSession>(conn)
        .await
}
