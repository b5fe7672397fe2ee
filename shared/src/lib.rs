pub mod search;
pub mod visibility;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Customer and delivery details stored in a lead's `info` column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl LeadInfo {
    /// Lenient parse: anything that is not an object, or fields of the wrong
    /// type, just come back as `None`.
    pub fn from_json(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            name: field("name"),
            region: field("region"),
            delivery_address: field("delivery_address"),
            phone: field("phone"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentStatus {
    Pending,
    Completed,
    Cancelled,
    Other(String),
}

impl AssignmentStatus {
    pub const PENDING: &'static str = "pending";

    pub fn parse(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "pending" => AssignmentStatus::Pending,
            "completed" => AssignmentStatus::Completed,
            "cancelled" => AssignmentStatus::Cancelled,
            _ => AssignmentStatus::Other(status.trim().to_string()),
        }
    }

    /// Completed and cancelled deliveries drop out of the courier's list.
    pub fn is_closed(&self) -> bool {
        matches!(self, AssignmentStatus::Completed | AssignmentStatus::Cancelled)
    }
}

/// Reads a quantity out of a lead's product map.
///
/// CRM exports are inconsistent, so numeric strings and integral floats are
/// accepted alongside plain integers.
pub fn parse_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                (i >= 0).then_some(i)
            } else {
                let f = n.as_f64()?;
                (f >= 0.0 && f.fract() == 0.0 && f <= i64::MAX as f64).then_some(f as i64)
            }
        }
        Value::String(s) => parse_quantity(&Value::Number(s.trim().parse().ok()?)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDemand {
    pub product_name: String,
    pub quantity: i64,
    /// First lead that ordered the product; used as the order's lead reference.
    pub first_lead_id: i64,
}

/// Sums requested quantities per product across `(lead_id, products)` pairs.
///
/// Leads are visited in the order given, which decides `first_lead_id`.
/// Results are ordered by product name.
pub fn aggregate_product_quantities<'a, I>(leads: I) -> Vec<ProductDemand>
where
    I: IntoIterator<Item = (i64, &'a Value)>,
{
    let mut demand: BTreeMap<String, ProductDemand> = BTreeMap::new();

    for (lead_id, products) in leads {
        let Some(products) = products.as_object() else {
            continue;
        };

        for (name, raw_quantity) in products {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let quantity = match parse_quantity(raw_quantity) {
                Some(q) if q > 0 => q,
                _ => continue,
            };

            demand
                .entry(name.to_string())
                .and_modify(|d| d.quantity = d.quantity.saturating_add(quantity))
                .or_insert_with(|| ProductDemand {
                    product_name: name.to_string(),
                    quantity,
                    first_lead_id: lead_id,
                });
        }
    }

    demand.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lead_info_ignores_wrong_types_and_blanks() {
        let info = LeadInfo::from_json(&json!({
            "name": "  Aigerim ",
            "region": 12,
            "delivery_address": "",
        }));

        assert_eq!(info.name.as_deref(), Some("Aigerim"));
        assert_eq!(info.region, None);
        assert_eq!(info.delivery_address, None);
        assert_eq!(LeadInfo::from_json(&json!("not an object")), LeadInfo::default());
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert!(AssignmentStatus::parse("Completed").is_closed());
        assert!(AssignmentStatus::parse(" cancelled ").is_closed());
        assert!(!AssignmentStatus::parse("pending").is_closed());
        assert_eq!(
            AssignmentStatus::parse("en route"),
            AssignmentStatus::Other("en route".to_string())
        );
    }

    #[test]
    fn quantities_accept_numbers_and_numeric_strings() {
        assert_eq!(parse_quantity(&json!(4)), Some(4));
        assert_eq!(parse_quantity(&json!(2.0)), Some(2));
        assert_eq!(parse_quantity(&json!(" 7 ")), Some(7));
        assert_eq!(parse_quantity(&json!(1.5)), None);
        assert_eq!(parse_quantity(&json!(-3)), None);
        assert_eq!(parse_quantity(&json!("many")), None);
        assert_eq!(parse_quantity(&json!(null)), None);
    }

    #[test]
    fn aggregates_quantities_per_product() {
        let first = json!({"A": 5, "B": 3});
        let second = json!({"A": 2});

        let demand = aggregate_product_quantities([(10, &first), (11, &second)]);

        assert_eq!(
            demand,
            vec![
                ProductDemand { product_name: "A".into(), quantity: 7, first_lead_id: 10 },
                ProductDemand { product_name: "B".into(), quantity: 3, first_lead_id: 10 },
            ]
        );
    }

    #[test]
    fn aggregation_skips_unusable_entries() {
        let odd = json!({" ": 4, "C": 0, "D": "x", " E ": "2"});
        let not_a_map = json!([1, 2, 3]);

        let demand = aggregate_product_quantities([(1, &not_a_map), (2, &odd)]);

        assert_eq!(demand.len(), 1);
        assert_eq!(demand[0].product_name, "E");
        assert_eq!(demand[0].quantity, 2);
        assert_eq!(demand[0].first_lead_id, 2);
    }
}
