/// Dashboard item shapes returned by the backend's read-only feeds,
/// plus the persisted report row from the hosted store.

use serde::{Deserialize, Serialize};

use crate::research::Entity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(rename = "marketCap", default)]
    pub market_cap: f64,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechEvent {
    pub company: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub event_type: String, // e.g. "Product Launch", "Partnership", "Research"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductNews {
    pub company: String,
    pub product_name: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub category: String, // e.g. "AI", "Cloud", "Hardware"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulatoryUpdate {
    pub title: String,
    pub description: String,
    pub region: String, // e.g. "US", "EU", "Global"
    pub date: String,
    pub impact_level: String, // e.g. "High", "Medium", "Low"
}

/// A persisted report row, queried newest-first. Writes happen in the
/// analysis backend, never from this codebase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub event_date: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}
