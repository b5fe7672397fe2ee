use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Queryable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::leads)]
pub struct Lead {
    pub id: i64,
    pub info: serde_json::Value,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<String>,
    pub products: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn lead_info(&self) -> shared::LeadInfo {
        shared::LeadInfo::from_json(&self.info)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::truck_assignments)]
pub struct TruckAssignment {
    pub id: i32,
    pub lead_id: i64,
    pub delivery_date: NaiveDate,
    pub truck_name: String,
    pub delivery_time: Option<String>,
    pub status: String,
    pub assigned_by: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::truck_assignments)]
pub struct NewTruckAssignment {
    pub lead_id: i64,
    pub delivery_date: NaiveDate,
    pub truck_name: String,
    pub delivery_time: Option<String>,
    pub status: String,
    pub assigned_by: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::districts)]
pub struct District {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Partial district update; `None` fields are left alone.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = crate::schema::districts)]
pub struct DistrictChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub product_type: String,
    pub volume: Option<BigDecimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct {
    pub name: String,
    pub product_type: String,
    pub volume: Option<BigDecimal>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::production_orders)]
pub struct ProductionOrder {
    pub id: i32,
    pub product_id: i32,
    pub lead_id: i64,
    pub quantity: i32,
    pub production_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::production_orders)]
pub struct NewProductionOrder {
    pub product_id: i32,
    pub lead_id: i64,
    pub quantity: i32,
    pub production_date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::production_sessions)]
pub struct ProductionSession {
    pub id: i32,
    pub session_date: NaiveDate,
    pub time_slot: String,
    pub produced_units: i32,
    pub available_bottles: i32,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::production_sessions)]
pub struct NewProductionSession {
    pub session_date: NaiveDate,
    pub time_slot: String,
    pub produced_units: i32,
    pub available_bottles: i32,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::crm_webhook_events)]
pub struct NewCrmWebhookEvent {
    pub kind: String,
    pub account_id: Option<String>,
    pub payload: serde_json::Value,
}
