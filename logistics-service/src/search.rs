use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use shared::search::{clamp_limit, like_pattern, normalize_query, DistinctAddresses};

use crate::api::AppState;
use crate::error::ApiResult;
use crate::models::Lead;
use crate::schema::leads;

/// Rows fetched per round trip while collecting distinct addresses.
const PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct AddressSearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AddressMatch {
    pub address: String,
    pub lead_id: i64,
    pub name: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddressSearchResponse {
    pub results: Vec<AddressMatch>,
}

pub async fn search_addresses(
    State(state): State<AppState>,
    query: Result<Query<AddressSearchQuery>, QueryRejection>,
) -> ApiResult<Json<AddressSearchResponse>> {
    let Query(query) = query?;

    let Some(term) = normalize_query(query.q.as_deref()) else {
        return Ok(Json(AddressSearchResponse { results: Vec::new() }));
    };
    let limit = clamp_limit(query.limit, state.config.search_max_limit);

    let mut conn = state.pool.get().await?;
    let results = find_addresses(&mut conn, &term, limit as usize).await?;
    tracing::debug!("Address search for {:?} returned {} results", term, results.len());

    Ok(Json(AddressSearchResponse { results }))
}

/// Newest leads whose delivery address contains `term`, one per distinct
/// address. Pages through matches until `limit` addresses are collected, so
/// a run of repeat orders cannot crowd out older addresses.
pub async fn find_addresses(
    conn: &mut AsyncPgConnection,
    term: &str,
    limit: usize,
) -> QueryResult<Vec<AddressMatch>> {
    let pattern = like_pattern(term);
    let mut distinct = DistinctAddresses::new(limit);
    let mut offset = 0;

    while !distinct.is_full() {
        let page = leads::table
            .filter(
                diesel::dsl::sql::<Bool>("info ->> 'delivery_address' ILIKE ")
                    .bind::<Text, _>(pattern.clone()),
            )
            .order((leads::created_at.desc(), leads::id.desc()))
            .limit(PAGE_SIZE)
            .offset(offset)
            .load::<Lead>(conn)
            .await?;
        let exhausted = (page.len() as i64) < PAGE_SIZE;
        offset += PAGE_SIZE;

        for lead in page {
            let info = lead.lead_info();
            let Some(address) = info.delivery_address else {
                continue;
            };
            distinct.offer(
                &address.clone(),
                AddressMatch {
                    address,
                    lead_id: lead.id,
                    name: info.name,
                    region: info.region,
                },
            );
        }

        if exhausted {
            break;
        }
    }

    Ok(distinct.into_vec())
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{body_json, offline_router};
    use axum::{body::Body, http::{Request, StatusCode}};
    use serde_json::json;
    use tower::ServiceExt;

    async fn search(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = offline_router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    // The offline router would answer 500 if the store were touched.
    #[tokio::test]
    async fn short_queries_never_reach_the_store() {
        for uri in [
            "/api/search/address",
            "/api/search/address?q=",
            "/api/search/address?q=a",
            "/api/search/address?q=%20b%20&limit=5",
        ] {
            let (status, body) = search(uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body, json!({"results": []}), "{uri}");
        }
    }

    #[tokio::test]
    async fn long_query_does_reach_the_store() {
        let (status, _) = search("/api/search/address?q=ab").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn search_allows_any_origin() {
        let response = offline_router()
            .oneshot(
                Request::get("/api/search/address?q=x")
                    .header("origin", "https://crm.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn bad_limit_is_a_400() {
        let (status, body) = search("/api/search/address?q=abc&limit=many").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));
    }
}
