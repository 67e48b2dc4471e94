//! Dashboard statistics: the four headline figures and the chart series.
//!
//! Nothing here is cached. Every call re-reads the tables.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::AccountType,
};

/// Length of the forward window used for "upcoming payments".
pub const UPCOMING_WINDOW_DAYS: u64 = 30;

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct DashboardStats {
    pub total_income: BigDecimal,
    pub total_expenses: BigDecimal,
    pub cash_flow: BigDecimal,
    pub upcoming_payments: BigDecimal,
}

impl DashboardStats {
    pub fn new(total_income: BigDecimal, total_expenses: BigDecimal, upcoming: BigDecimal) -> Self {
        let cash_flow = &total_income - &total_expenses;
        Self {
            total_income,
            total_expenses,
            cash_flow,
            upcoming_payments: upcoming,
        }
    }
}

/// Inclusive date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DueWindow {
    pub fn upcoming_from(today: NaiveDate) -> AppResult<Self> {
        let end = today
            .checked_add_days(Days::new(UPCOMING_WINDOW_DAYS))
            .ok_or_else(|| AppError::Internal(format!("date out of range: {today}")))?;
        Ok(Self { start: today, end })
    }

    #[cfg(test)]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Read side needed by [`dashboard_stats`].
#[async_trait]
pub trait StatsSource {
    /// Sum of balances of every account of the given type, zero when none match.
    async fn balance_total(&self, account_type: AccountType) -> AppResult<BigDecimal>;

    /// Sum of pending invoice amounts due inside `window`, zero when none match.
    async fn pending_invoices_due(&self, window: DueWindow) -> AppResult<BigDecimal>;
}

pub async fn dashboard_stats<S>(source: &S, today: NaiveDate) -> AppResult<DashboardStats>
where
    S: StatsSource + Sync,
{
    let income = source.balance_total(AccountType::Revenue).await?;
    let expenses = source.balance_total(AccountType::Expense).await?;
    let upcoming = source
        .pending_invoices_due(DueWindow::upcoming_from(today)?)
        .await?;

    Ok(DashboardStats::new(income, expenses, upcoming))
}

#[async_trait]
impl StatsSource for Pool<Postgres> {
    async fn balance_total(&self, account_type: AccountType) -> AppResult<BigDecimal> {
        let total: Option<BigDecimal> = sqlx::query_scalar(
            "SELECT COALESCE(SUM(balance), 0) FROM chart_of_accounts WHERE account_type = $1",
        )
        .bind(account_type.as_str())
        .fetch_one(self)
        .await?;

        Ok(total.unwrap_or_default())
    }

    async fn pending_invoices_due(&self, window: DueWindow) -> AppResult<BigDecimal> {
        let total: Option<BigDecimal> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM invoices
            WHERE
                due_date BETWEEN $1 AND $2 AND
                status = 'Pending'
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .fetch_one(self)
        .await?;

        Ok(total.unwrap_or_default())
    }
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct MonthlyFlow {
    pub month: String,
    pub income: BigDecimal,
    pub expense: BigDecimal,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone)]
pub struct BudgetSlice {
    pub category: String,
    pub amount: BigDecimal,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct ChartsData {
    pub income_expense: Vec<MonthlyFlow>,
    pub budget_distribution: Vec<BudgetSlice>,
}

/// Months of income/expense history shown on the dashboard chart.
pub const CHART_MONTHS: usize = 6;

#[async_trait]
pub trait ChartsSource {
    /// Per-month payment totals (`YYYY-MM`), most recent `months` first.
    async fn monthly_flows(&self, months: usize) -> AppResult<Vec<MonthlyFlow>>;

    /// Budget amount per category.
    async fn budget_totals(&self) -> AppResult<Vec<BudgetSlice>>;
}

/// Chart series: the latest [`CHART_MONTHS`] months newest first, and budget
/// categories largest first.
pub async fn charts_data<S>(source: &S) -> AppResult<ChartsData>
where
    S: ChartsSource + Sync,
{
    let mut income_expense = source.monthly_flows(CHART_MONTHS).await?;
    income_expense.sort_by(|a, b| b.month.cmp(&a.month));
    income_expense.truncate(CHART_MONTHS);

    let mut budget_distribution = source.budget_totals().await?;
    budget_distribution.sort_by(|a, b| b.amount.cmp(&a.amount));

    Ok(ChartsData {
        income_expense,
        budget_distribution,
    })
}

#[async_trait]
impl ChartsSource for Pool<Postgres> {
    async fn monthly_flows(&self, months: usize) -> AppResult<Vec<MonthlyFlow>> {
        let rows: Vec<MonthlyFlow> = sqlx::query_as(
            r#"
            SELECT
                to_char(date_trunc('month', payment_date), 'YYYY-MM') AS month,
                COALESCE(SUM(amount) FILTER (WHERE payment_type = 'Receive'), 0) AS income,
                COALESCE(SUM(amount) FILTER (WHERE payment_type = 'Send'), 0) AS expense
            FROM
                payments
            GROUP BY
                1
            ORDER BY
                1 DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(months).unwrap_or(i64::MAX))
        .fetch_all(self)
        .await?;

        Ok(rows)
    }

    async fn budget_totals(&self) -> AppResult<Vec<BudgetSlice>> {
        let rows: Vec<BudgetSlice> = sqlx::query_as(
            r#"
            SELECT
                category,
                COALESCE(SUM(amount), 0) AS amount
            FROM
                budgets
            GROUP BY
                category
            "#,
        )
        .fetch_all(self)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use rstest::rstest;

    struct Invoice {
        due_date: NaiveDate,
        amount: BigDecimal,
        status: &'static str,
    }

    #[derive(Default)]
    struct InMemory {
        accounts: Vec<(AccountType, BigDecimal)>,
        invoices: Vec<Invoice>,
    }

    #[async_trait]
    impl StatsSource for InMemory {
        async fn balance_total(&self, account_type: AccountType) -> AppResult<BigDecimal> {
            Ok(self
                .accounts
                .iter()
                .filter(|(t, _)| *t == account_type)
                .map(|(_, b)| b.clone())
                .sum())
        }

        async fn pending_invoices_due(&self, window: DueWindow) -> AppResult<BigDecimal> {
            Ok(self
                .invoices
                .iter()
                .filter(|i| i.status == "Pending" && window.contains(i.due_date))
                .map(|i| i.amount.clone())
                .sum())
        }
    }

    struct Failing;

    #[async_trait]
    impl StatsSource for Failing {
        async fn balance_total(&self, _: AccountType) -> AppResult<BigDecimal> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn pending_invoices_due(&self, _: DueWindow) -> AppResult<BigDecimal> {
            Ok(BigDecimal::from(0))
        }
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn days_from_today(n: u64) -> NaiveDate {
        today().checked_add_days(Days::new(n)).unwrap()
    }

    #[tokio::test]
    async fn revenue_and_expense_example() {
        let source = InMemory {
            accounts: vec![
                (AccountType::Revenue, dec("100000")),
                (AccountType::Expense, dec("60000")),
            ],
            ..Default::default()
        };

        let stats = dashboard_stats(&source, today()).await.unwrap();

        assert_eq!(stats.total_income, dec("100000"));
        assert_eq!(stats.total_expenses, dec("60000"));
        assert_eq!(stats.cash_flow, dec("40000"));
        assert_eq!(stats.upcoming_payments, dec("0"));
    }

    #[tokio::test]
    async fn empty_tables_yield_zeros() {
        let stats = dashboard_stats(&InMemory::default(), today()).await.unwrap();
        assert_eq!(stats, DashboardStats::default());
    }

    #[tokio::test]
    async fn only_matching_account_types_are_summed() {
        let source = InMemory {
            accounts: vec![
                (AccountType::Revenue, dec("1200.50")),
                (AccountType::Revenue, dec("799.50")),
                (AccountType::Expense, dec("2500.25")),
                (AccountType::Asset, dec("999999")),
                (AccountType::Liability, dec("-42")),
            ],
            ..Default::default()
        };

        let stats = dashboard_stats(&source, today()).await.unwrap();

        assert_eq!(stats.total_income, dec("2000.00"));
        assert_eq!(stats.total_expenses, dec("2500.25"));
        assert_eq!(stats.cash_flow, dec("-500.25"));
        assert_eq!(
            &stats.total_income - &stats.total_expenses,
            stats.cash_flow
        );
    }

    #[tokio::test]
    async fn upcoming_payments_cover_thirty_day_window() {
        let invoice = |day, amount: &str, status| Invoice {
            due_date: days_from_today(day),
            amount: dec(amount),
            status,
        };
        let source = InMemory {
            invoices: vec![
                invoice(0, "100", "Pending"),
                invoice(30, "200", "Pending"),
                invoice(31, "400", "Pending"),
                invoice(5, "800", "Paid"),
                invoice(5, "1600", "Overdue"),
            ],
            ..Default::default()
        };

        let stats = dashboard_stats(&source, today()).await.unwrap();

        assert_eq!(stats.upcoming_payments, dec("300"));
    }

    #[rstest]
    #[case(0, true)]
    #[case(30, true)]
    #[case(31, false)]
    fn window_bounds_are_inclusive(#[case] offset: u64, #[case] inside: bool) {
        let window = DueWindow::upcoming_from(today()).unwrap();
        assert_eq!(window.contains(days_from_today(offset)), inside);
    }

    #[test]
    fn window_excludes_past_dates() {
        let window = DueWindow::upcoming_from(today()).unwrap();
        assert!(!window.contains(today().pred_opt().unwrap()));
    }

    #[tokio::test]
    async fn data_access_failure_propagates() {
        let err = dashboard_stats(&Failing, today()).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    struct Charts {
        months: Vec<(&'static str, &'static str, &'static str)>,
        budgets: Vec<(&'static str, &'static str)>,
    }

    #[async_trait]
    impl ChartsSource for Charts {
        async fn monthly_flows(&self, _: usize) -> AppResult<Vec<MonthlyFlow>> {
            Ok(self
                .months
                .iter()
                .map(|(month, income, expense)| MonthlyFlow {
                    month: month.to_string(),
                    income: dec(income),
                    expense: dec(expense),
                })
                .collect())
        }

        async fn budget_totals(&self) -> AppResult<Vec<BudgetSlice>> {
            Ok(self
                .budgets
                .iter()
                .map(|(category, amount)| BudgetSlice {
                    category: category.to_string(),
                    amount: dec(amount),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn charts_keep_latest_six_months_newest_first() {
        let source = Charts {
            months: vec![
                ("2025-01", "10", "5"),
                ("2025-08", "80", "40"),
                ("2025-03", "30", "15"),
                ("2024-12", "1", "1"),
                ("2025-07", "70", "35"),
                ("2025-05", "50", "25"),
                ("2025-04", "40", "20"),
                ("2025-06", "60", "30"),
            ],
            budgets: Vec::new(),
        };

        let charts = charts_data(&source).await.unwrap();

        let months: Vec<&str> = charts.income_expense.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(
            months,
            vec!["2025-08", "2025-07", "2025-06", "2025-05", "2025-04", "2025-03"]
        );
        assert_eq!(charts.income_expense[0].income, dec("80"));
        assert_eq!(charts.income_expense[0].expense, dec("40"));
    }

    #[tokio::test]
    async fn budget_slices_are_largest_first() {
        let source = Charts {
            months: Vec::new(),
            budgets: vec![("Travel", "1500"), ("Payroll", "90000"), ("Supplies", "4200.50")],
        };

        let charts = charts_data(&source).await.unwrap();

        let categories: Vec<&str> = charts
            .budget_distribution
            .iter()
            .map(|b| b.category.as_str())
            .collect();
        assert_eq!(categories, vec!["Payroll", "Supplies", "Travel"]);
        assert!(charts.income_expense.is_empty());
    }
}
