use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    response::Json,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{District, DistrictChanges};
use crate::schema::districts;

pub async fn list_districts(State(state): State<AppState>) -> ApiResult<Json<Vec<District>>> {
    let mut conn = state.pool.get().await?;
    let rows = districts::table
        .order(districts::name.asc())
        .load::<District>(&mut conn)
        .await?;

    Ok(Json(rows))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDistrictRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateDistrictRequest {
    pub fn into_changes(self) -> ApiResult<DistrictChanges> {
        if self.name.is_none() && self.description.is_none() && self.is_active.is_none() {
            return Err(ApiError::bad_request("No fields to update"));
        }

        let name = match self.name {
            Some(name) if name.trim().is_empty() => return Err(ApiError::bad_request("name must not be blank")),
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };

        Ok(DistrictChanges {
            name,
            description: self.description,
            is_active: self.is_active,
            updated_at: Some(Utc::now()),
        })
    }
}

pub async fn update_district(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateDistrictRequest>, JsonRejection>,
) -> ApiResult<Json<District>> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let changes = request.into_changes()?;

    let mut conn = state.pool.get().await?;
    let district = apply_district_changes(&mut conn, id, &changes).await?;

    tracing::info!("Updated district {} ({})", district.id, district.name);
    Ok(Json(district))
}

/// Writes only the columns set in `changes`.
pub async fn apply_district_changes(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: &DistrictChanges,
) -> ApiResult<District> {
    match diesel::update(districts::table.find(id))
        .set(changes)
        .get_result::<District>(conn)
        .await
    {
        Ok(district) => Ok(district),
        Err(DieselError::NotFound) => Err(ApiError::not_found(format!("District {} not found", id))),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            Err(ApiError::bad_request("A district with this name already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_supplied_fields_change() {
        let changes = UpdateDistrictRequest {
            is_active: Some(false),
            ..Default::default()
        }
        .into_changes()
        .unwrap();

        assert_eq!(changes.is_active, Some(false));
        assert_eq!(changes.name, None);
        assert_eq!(changes.description, None);
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = UpdateDistrictRequest::default().into_changes().unwrap_err();
        assert_eq!(err.to_string(), "No fields to update");
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = UpdateDistrictRequest {
            name: Some("   ".to_string()),
            ..Default::default()
        }
        .into_changes()
        .unwrap_err();
        assert_eq!(err.to_string(), "name must not be blank");
    }
}
