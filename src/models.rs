use serde::Serialize;
use sqlx::types::{
    chrono::{DateTime, NaiveDate, Utc},
    BigDecimal, Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Equity => "Equity",
            AccountType::Revenue => "Revenue",
            AccountType::Expense => "Expense",
        }
    }
}

#[derive(sqlx::FromRow, Serialize, Default, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(sqlx::FromRow, Serialize, Default, Debug, Clone)]
pub struct Account {
    pub account_code: String,
    pub account_name: String,
    pub account_type: String,
    pub balance: BigDecimal,
    pub status: String,
}

#[derive(sqlx::FromRow, Serialize, Default, Debug, Clone)]
pub struct DisbursementRequest {
    pub id: Uuid,
    pub description: String,
    pub department: Option<String>,
    pub amount: BigDecimal,
    pub status: String,
    pub date_requested: NaiveDate,
    pub date_approved: Option<NaiveDate>,
    pub requested_by: Option<Uuid>,
    pub requested_by_name: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_by_name: Option<String>,
    pub reason: Option<String>,
}

#[derive(sqlx::FromRow, Serialize, Default, Debug, Clone)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub party_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount: BigDecimal,
    pub status: String,
}

#[derive(sqlx::FromRow, Serialize, Default, Debug, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_number: Option<String>,
    pub party_name: Option<String>,
    #[serde(rename = "date")]
    pub payment_date: NaiveDate,
    pub amount: BigDecimal,
    #[serde(rename = "type")]
    pub payment_type: String,
    pub method: Option<String>,
    pub status: String,
}

#[derive(sqlx::FromRow, Serialize, Default, Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Default, Debug, Clone)]
pub struct Budget {
    pub id: Uuid,
    pub category: String,
    pub fiscal_year: i32,
    pub amount: BigDecimal,
    pub status: String,
}

#[derive(sqlx::FromRow, Serialize, Default, Debug, Clone)]
pub struct JournalEntry {
    pub id: Uuid,
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub account_code: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub status: String,
}
