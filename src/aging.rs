//! Receivables aging: outstanding invoices bucketed by days past due.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::error::AppResult;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgingBucket {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "1-30")]
    Days1To30,
    #[serde(rename = "31-60")]
    Days31To60,
    #[serde(rename = "61-90")]
    Days61To90,
    #[serde(rename = "90+")]
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Days1To30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];

    pub fn for_due_date(due: NaiveDate, today: NaiveDate) -> Self {
        match (today - due).num_days() {
            d if d <= 0 => AgingBucket::Current,
            1..=30 => AgingBucket::Days1To30,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Current => "Current",
            AgingBucket::Days1To30 => "1-30 days",
            AgingBucket::Days31To60 => "31-60 days",
            AgingBucket::Days61To90 => "61-90 days",
            AgingBucket::Over90 => "Over 90 days",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AgingRow {
    pub bucket: AgingBucket,
    pub label: &'static str,
    pub count: usize,
    pub total: BigDecimal,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub rows: Vec<AgingRow>,
    pub total: BigDecimal,
}

impl AgingReport {
    pub fn build(as_of: NaiveDate, outstanding: &[(NaiveDate, BigDecimal)]) -> Self {
        let mut rows: Vec<AgingRow> = AgingBucket::ALL
            .iter()
            .map(|b| AgingRow {
                bucket: *b,
                label: b.label(),
                count: 0,
                total: BigDecimal::from(0),
            })
            .collect();

        for (due, amount) in outstanding {
            let bucket = AgingBucket::for_due_date(*due, as_of);
            if let Some(row) = rows.iter_mut().find(|r| r.bucket == bucket) {
                row.count += 1;
                row.total += amount;
            }
        }

        let total = rows.iter().map(|r| r.total.clone()).sum();
        Self { as_of, rows, total }
    }
}

pub async fn aging_report(p: &Pool<Postgres>, today: NaiveDate) -> AppResult<AgingReport> {
    let outstanding: Vec<(NaiveDate, BigDecimal)> =
        sqlx::query_as("SELECT due_date, amount FROM invoices WHERE status <> 'Paid'")
            .fetch_all(p)
            .await?;

    Ok(AgingReport::build(today, &outstanding))
}
