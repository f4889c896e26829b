//! Core Data Models
//!
//! This module defines the wire types exchanged with the PIMS analytics API and the
//! session types persisted on the client. All analytics are computed upstream; these
//! types only describe the shape of what the backend delivers.
//!
//! ## Data Flow
//!
//! 1. **Authentication**: [`LoginRequest`] → [`LoginResponse`] carrying the bearer token
//!    and the [`User`] profile stored in the session
//! 2. **Snapshot**: [`AnalyticsSnapshot`] - one immutable payload wrapping an
//!    [`AnalyticsResponse`], replaced wholesale on every fetch
//! 3. **Freshness**: [`LastUpdated`] - lightweight poll for the "last updated" header
//!
//! ## Core Types
//!
//! ### Analytics
//! - [`AnalyticsResponse`] - Flat bag of independent collections (no cross references)
//! - [`KeyMetric`] - Labeled statistic whose value is decoded into [`MetricValue`]
//! - [`CategorySlice`], [`MonthlySeriesPoint`] - Chart series
//! - [`SupplierSummary`], [`TopPerformer`], [`Product`] - Table rows
//!
//! ### Account
//! - [`User`] - Profile cached alongside the token
//! - [`AccountUpdate`] - Partial account update, absent fields are not sent
//!
//! ## Features
//!
//! - **Tagged metric values**: the untyped `value` field is classified exactly once at
//!   the deserialization boundary
//! - **Lenient collections**: every analytics collection defaults to empty when absent

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(rename = "fullName", default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl User {
    /// Name shown in headers: the full name when present, else the username
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(rename = "currentPassword", skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(rename = "newPassword", skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUpdateResponse {
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastUpdated {
    #[serde(rename = "pharmacyId")]
    pub pharmacy_id: String,
    #[serde(rename = "lastUpdatedAt", default)]
    pub last_updated_at: Option<String>,
}

/// A metric value as delivered by the backend, classified once on decode.
///
/// The producer sends `string | number | object | null`; strings may still embed a
/// trailing percentage or a JSON-encoded breakdown, which the metric parser handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum MetricValue {
    Numeric(f64),
    Text(String),
    Breakdown(Map<String, Value>),
    Empty,
}

impl From<Value> for MetricValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => MetricValue::Empty,
            Value::Number(n) => n.as_f64().map(MetricValue::Numeric).unwrap_or(MetricValue::Empty),
            Value::String(s) => MetricValue::Text(s),
            Value::Object(map) => MetricValue::Breakdown(map),
            // Arrays and booleans are rendered through their JSON text
            other => MetricValue::Text(other.to_string()),
        }
    }
}

impl From<MetricValue> for Value {
    fn from(value: MetricValue) -> Self {
        match value {
            MetricValue::Numeric(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            MetricValue::Text(s) => Value::String(s),
            MetricValue::Breakdown(map) => Value::Object(map),
            MetricValue::Empty => Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetric {
    pub label: String,
    #[serde(default = "empty_metric_value")]
    pub value: MetricValue,
    #[serde(rename = "trendUp", default)]
    pub trend_up: bool,
}

fn empty_metric_value() -> MetricValue {
    MetricValue::Empty
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub category: String,
    #[serde(rename = "stockQty", default)]
    pub stock_qty: i64,
    #[serde(rename = "soldQty", default)]
    pub sold_qty: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeriesPoint {
    pub month: String,
    #[serde(default)]
    pub stocked: i64,
    #[serde(default)]
    pub sold: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "volumeSupplied", default)]
    pub volume_supplied: f64,
    #[serde(rename = "valueSupplied", default)]
    pub value_supplied: f64,
    #[serde(rename = "ordersDelivered", default)]
    pub orders_delivered: i64,
    #[serde(rename = "orderCompletionPct", default)]
    pub order_completion_pct: f64,
    #[serde(rename = "mostSuppliedItem", default)]
    pub most_supplied_item: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPerformer {
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "volumeSold", default)]
    pub volume_sold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "genericName")]
    pub generic_name: String,
    #[serde(rename = "tradeName", default, skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(rename = "batchNumber", default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(rename = "expiryDate", default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "unitPrice", default)]
    pub unit_price: f64,
    #[serde(rename = "lastRestock", default, skip_serializing_if = "Option::is_none")]
    pub last_restock: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(rename = "orderedQty", default, skip_serializing_if = "Option::is_none")]
    pub ordered_qty: Option<f64>,
}

impl Product {
    /// "Generic (Trade)" when a trade name is known
    pub fn display_name(&self) -> String {
        match self.trade_name.as_deref() {
            Some(trade) if !trade.trim().is_empty() => {
                format!("{} ({})", self.generic_name, trade)
            }
            _ => self.generic_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    #[serde(default)]
    pub metrics: Vec<KeyMetric>,
    #[serde(rename = "inventoryCards", default)]
    pub inventory_cards: Vec<KeyMetric>,
    #[serde(rename = "distributionByCategory", default)]
    pub distribution_by_category: Vec<CategorySlice>,
    #[serde(rename = "monthlyStockedVsSold", default)]
    pub monthly_stocked_vs_sold: Vec<MonthlySeriesPoint>,
    #[serde(rename = "topSuppliers", default)]
    pub top_suppliers: Vec<SupplierSummary>,
    #[serde(rename = "topPerformers", default)]
    pub top_performers: Vec<TopPerformer>,
    #[serde(rename = "outOfStockProducts", default)]
    pub out_of_stock_products: Vec<Product>,
    #[serde(rename = "expiredProducts", default)]
    pub expired_products: Vec<Product>,
    #[serde(rename = "soonToBeOutOfStockProducts", default)]
    pub soon_to_be_out_of_stock_products: Vec<Product>,
    #[serde(rename = "soonToExpireProducts", default)]
    pub soon_to_expire_products: Vec<Product>,
    #[serde(rename = "fastMovingProducts", default)]
    pub fast_moving_products: Vec<Product>,
    #[serde(rename = "slowMovingProducts", default)]
    pub slow_moving_products: Vec<Product>,
    #[serde(rename = "mostOrderedProducts", default)]
    pub most_ordered_products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    #[serde(rename = "pharmacyId")]
    pub pharmacy_id: String,
    #[serde(rename = "pharmacyName", default, skip_serializing_if = "Option::is_none")]
    pub pharmacy_name: Option<String>,
    #[serde(rename = "lastUpdatedAt", default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<String>,
    pub analytics: AnalyticsResponse,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: String,
    #[serde(rename = "storedAt")]
    pub stored_at: String,
}

impl AnalyticsSnapshot {
    /// Server-reported update time, or the upload time when the server omits it
    pub fn last_updated_stamp(&self) -> Option<&str> {
        self.last_updated_at
            .as_deref()
            .or_else(|| Some(self.uploaded_at.as_str()).filter(|s| !s.trim().is_empty()))
    }
}
