//! Per-resource list queries: every row of one table, optionally narrowed by a
//! single equality predicate. There is no pagination.

use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models,
};

/// A table that can be listed. `FILTERS` maps the public filter name to the
/// qualified column it compares against.
pub trait Listing: for<'r> FromRow<'r, PgRow> + Serialize + Default + Send + Unpin + 'static {
    const SELECT: &'static str;
    const ORDER_BY: &'static str;
    const FILTERS: &'static [(&'static str, &'static str)];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    column: &'static str,
    value: String,
}

impl ListFilter {
    pub fn for_listing<T: Listing>(name: &str, value: impl Into<String>) -> AppResult<Self> {
        let column = T::FILTERS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
            .ok_or_else(|| AppError::Validation(format!("unsupported filter: {name}")))?;
        Ok(Self {
            column,
            value: value.into(),
        })
    }
}

/// `?status=` as sent by list endpoints. `all` or a missing value disables
/// filtering; anything else is matched exactly, case included.
#[derive(Deserialize, Debug, Default)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    pub fn status_filter(&self) -> Option<&str> {
        match self.status.as_deref() {
            None | Some("all") => None,
            Some(s) => Some(s),
        }
    }

    pub fn to_filter<T: Listing>(&self) -> AppResult<Option<ListFilter>> {
        self.status_filter()
            .map(|s| ListFilter::for_listing::<T>("status", s))
            .transpose()
    }
}

pub fn list_sql<T: Listing>(filter: Option<&ListFilter>) -> String {
    match filter {
        Some(f) => format!("{} WHERE {} = $1 ORDER BY {}", T::SELECT, f.column, T::ORDER_BY),
        None => format!("{} ORDER BY {}", T::SELECT, T::ORDER_BY),
    }
}

pub async fn list<T: Listing>(p: &Pool<Postgres>, filter: Option<&ListFilter>) -> AppResult<Vec<T>> {
    let sql = list_sql::<T>(filter);
    let mut query = sqlx::query_as::<_, T>(&sql);
    if let Some(f) = filter {
        query = query.bind(f.value.clone());
    }
    Ok(query.fetch_all(p).await?)
}

impl Listing for models::Account {
    const SELECT: &'static str = "SELECT account_code, account_name, account_type, balance, status FROM chart_of_accounts";
    const ORDER_BY: &'static str = "account_code";
    const FILTERS: &'static [(&'static str, &'static str)] =
        &[("status", "status"), ("account_type", "account_type")];
}

impl Listing for models::DisbursementRequest {
    const SELECT: &'static str = r#"
        SELECT
            dr.id,
            dr.description,
            dr.department,
            dr.amount,
            dr.status,
            dr.date_requested,
            dr.date_approved,
            dr.requested_by,
            u.name AS requested_by_name,
            dr.approved_by,
            u2.name AS approved_by_name,
            dr.reason
        FROM disbursement_requests dr
        LEFT JOIN users u ON dr.requested_by = u.id
        LEFT JOIN users u2 ON dr.approved_by = u2.id"#;
    const ORDER_BY: &'static str = "dr.date_requested DESC";
    const FILTERS: &'static [(&'static str, &'static str)] = &[("status", "dr.status")];
}

impl Listing for models::Invoice {
    const SELECT: &'static str = "SELECT id, invoice_number, party_name, issue_date, due_date, amount, status FROM invoices";
    const ORDER_BY: &'static str = "due_date";
    const FILTERS: &'static [(&'static str, &'static str)] = &[("status", "status")];
}

impl Listing for models::Payment {
    const SELECT: &'static str = "SELECT id, invoice_number, party_name, payment_date, amount, payment_type, method, status FROM payments";
    const ORDER_BY: &'static str = "payment_date DESC";
    const FILTERS: &'static [(&'static str, &'static str)] =
        &[("status", "status"), ("type", "payment_type")];
}

impl Listing for models::Budget {
    const SELECT: &'static str = "SELECT id, category, fiscal_year, amount, status FROM budgets";
    const ORDER_BY: &'static str = "fiscal_year DESC, category";
    const FILTERS: &'static [(&'static str, &'static str)] = &[("status", "status")];
}

impl Listing for models::JournalEntry {
    const SELECT: &'static str = "SELECT id, entry_date, description, reference, account_code, debit, credit, status FROM journal_entries";
    const ORDER_BY: &'static str = "entry_date DESC";
    const FILTERS: &'static [(&'static str, &'static str)] = &[("status", "status")];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, DisbursementRequest, Payment};
    use rstest::rstest;

    fn query(status: Option<&str>) -> StatusQuery {
        StatusQuery {
            status: status.map(str::to_string),
        }
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("all"), None)]
    #[case(Some("Pending"), Some("Pending"))]
    #[case(Some("pending"), Some("pending"))]
    #[case(Some("ALL"), Some("ALL"))]
    fn status_all_or_missing_disables_filter(
        #[case] status: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(query(status).status_filter(), expected);
    }

    #[test]
    fn unfiltered_sql_keeps_ordering() {
        assert_eq!(
            list_sql::<Account>(None),
            "SELECT account_code, account_name, account_type, balance, status FROM chart_of_accounts ORDER BY account_code"
        );
    }

    #[test]
    fn status_filter_binds_qualified_column() {
        let filter = query(Some("Pending"))
            .to_filter::<DisbursementRequest>()
            .unwrap()
            .unwrap();

        assert_eq!(filter.value, "Pending");
        let sql = list_sql::<DisbursementRequest>(Some(&filter));
        assert!(sql.ends_with("WHERE dr.status = $1 ORDER BY dr.date_requested DESC"));
    }

    #[test]
    fn payment_type_filter_uses_column_name() {
        let filter = ListFilter::for_listing::<Payment>("type", "Receive").unwrap();
        assert!(list_sql::<Payment>(Some(&filter)).contains("WHERE payment_type = $1"));
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let err = ListFilter::for_listing::<Account>("balance", "1").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
