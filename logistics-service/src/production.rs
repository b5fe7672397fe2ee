use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    response::Json,
};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use shared::aggregate_product_quantities;
use std::collections::BTreeMap;

use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use crate::leads::leads_for_date;
use crate::models::{NewProduct, NewProductionOrder, Product, ProductionOrder};
use crate::schema::{production_orders, products};

/// Catalog type given to products first seen on a lead.
pub const AUTO_PRODUCT_TYPE: &str = "unspecified";
pub const ORDER_PENDING: &str = "pending";

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub volume: Option<f64>,
    pub is_active: bool,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            product_type: product.product_type,
            volume: product.volume.as_ref().and_then(ToPrimitive::to_f64),
            is_active: product.is_active,
        }
    }
}

pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ProductResponse>>> {
    let Query(query) = query?;
    let mut conn = state.pool.get().await?;

    let mut select = products::table.order(products::name.asc()).into_boxed();
    if let Some(active) = query.active {
        select = select.filter(products::is_active.eq(active));
    }
    let rows = select.load::<Product>(&mut conn).await?;

    Ok(Json(rows.into_iter().map(ProductResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct OrderWithProduct {
    #[serde(flatten)]
    pub order: ProductionOrder,
    pub product_name: String,
}

pub async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<OrderWithProduct>>> {
    let Query(query) = query?;
    let date = query.date.ok_or_else(|| ApiError::missing("date"))?;

    let mut conn = state.pool.get().await?;
    let rows = production_orders::table
        .inner_join(products::table)
        .filter(production_orders::production_date.eq(date))
        .order(products::name.asc())
        .select((production_orders::all_columns, products::name))
        .load::<(ProductionOrder, String)>(&mut conn)
        .await?;

    Ok(Json(
        rows.into_iter()
            .map(|(order, product_name)| OrderWithProduct { order, product_name })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct GenerateOrdersRequest {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct CreatedOrder {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub lead_id: i64,
}

#[derive(Debug, Serialize)]
pub struct GenerationReport {
    pub date: NaiveDate,
    pub totals: BTreeMap<String, i64>,
    pub created: Vec<CreatedOrder>,
    /// Products that already had an order for the date.
    pub skipped: Vec<String>,
}

pub async fn generate_orders(
    State(state): State<AppState>,
    payload: Result<Json<GenerateOrdersRequest>, JsonRejection>,
) -> ApiResult<Json<GenerationReport>> {
    let Json(request) = payload?;
    let date = request.date.ok_or_else(|| ApiError::missing("date"))?;

    let mut conn = state.pool.get().await?;
    let report = generate_production_orders(&mut conn, date).await?;

    tracing::info!(
        "Production orders for {}: {} created, {} already scheduled",
        date,
        report.created.len(),
        report.skipped.len()
    );
    Ok(Json(report))
}

/// Turns the day's ordered quantities into one production order per product.
///
/// Runs in a single transaction. Products and orders are both guarded by
/// unique keys, so repeated or concurrent runs for a date never duplicate.
pub async fn generate_production_orders(
    conn: &mut AsyncPgConnection,
    date: NaiveDate,
) -> ApiResult<GenerationReport> {
    conn.transaction::<_, ApiError, _>(|conn| {
        Box::pin(async move {
            let day_leads = leads_for_date(conn, date).await?;
            let demand = aggregate_product_quantities(day_leads.iter().map(|lead| (lead.id, &lead.products)));

            let mut report = GenerationReport {
                date,
                totals: BTreeMap::new(),
                created: Vec::new(),
                skipped: Vec::new(),
            };

            for item in demand {
                report.totals.insert(item.product_name.clone(), item.quantity);

                let quantity = i32::try_from(item.quantity).map_err(|_| {
                    ApiError::bad_request(format!("Quantity for {} is out of range", item.product_name))
                })?;
                let product = find_or_create_product(conn, &item.product_name).await?;

                let inserted = diesel::insert_into(production_orders::table)
                    .values(&NewProductionOrder {
                        product_id: product.id,
                        lead_id: item.first_lead_id,
                        quantity,
                        production_date: date,
                        status: ORDER_PENDING.to_string(),
                    })
                    .on_conflict((production_orders::product_id, production_orders::production_date))
                    .do_nothing()
                    .get_result::<ProductionOrder>(conn)
                    .await
                    .optional()?;

                match inserted {
                    Some(order) => report.created.push(CreatedOrder {
                        id: order.id,
                        product_id: product.id,
                        product_name: product.name,
                        quantity: order.quantity,
                        lead_id: order.lead_id,
                    }),
                    None => report.skipped.push(product.name),
                }
            }

            Ok(report)
        })
    })
    .await
}

pub async fn find_or_create_product(conn: &mut AsyncPgConnection, name: &str) -> QueryResult<Product> {
    diesel::insert_into(products::table)
        .values(&NewProduct {
            name: name.to_string(),
            product_type: AUTO_PRODUCT_TYPE.to_string(),
            volume: None,
            is_active: true,
        })
        .on_conflict(products::name)
        .do_nothing()
        .execute(conn)
        .await?;

    products::table
        .filter(products::name.eq(name))
        .first::<Product>(conn)
        .await
}
