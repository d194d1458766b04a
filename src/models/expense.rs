use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDateTime,
    pub category: String,
    pub amount: f64,
    pub description: Option<String>,
    pub payment_method: String,
}

/// Body for POST /expenses and PUT /expenses/:id. `date` falls back to
/// the current time on create and to the stored value on update.
#[derive(Debug, Deserialize)]
pub struct ExpensePayload {
    pub category: String,
    pub amount: f64,
    pub description: Option<String>,
    pub payment_method: String,
    pub date: Option<NaiveDateTime>,
}

/// Optional, independently combinable list filters (AND semantics),
/// plus offset pagination.
#[derive(Debug, Deserialize)]
pub struct ExpenseFilter {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub category: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

fn default_limit() -> i64 {
    100
}

impl Default for ExpenseFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
            category: None,
            start_date: None,
            end_date: None,
            min_amount: None,
            max_amount: None,
        }
    }
}

/// Rolling statistics window, measured back from the evaluation instant.
/// Not calendar-aligned: "month" means the last 30 days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Timeframe {
    pub fn window(self) -> Duration {
        match self {
            Timeframe::Day => Duration::days(1),
            Timeframe::Week => Duration::days(7),
            Timeframe::Month => Duration::days(30),
            Timeframe::Year => Duration::days(365),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub timeframe: Timeframe,
}

/// Aggregates over an owner's expenses within a window.
#[derive(Debug, Serialize)]
pub struct ExpenseSummary {
    pub count: i64,
    pub total: f64,
    pub average: f64,
    pub by_category: HashMap<String, f64>,
}
