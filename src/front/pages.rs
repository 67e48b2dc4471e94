//! Sidebar screens. Every page id maps to one [`View`]; the fragment handler
//! renders that view instead of keeping one markup generator per screen.

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;

use super::{auth::SessionUser, components::table::TableComponent, AppState};
use crate::{
    aging,
    error::{AppError, AppResult},
    listing::{self, ListFilter, Listing},
    models,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Accounts,
    Disbursements,
    Invoices,
    Payments,
    Budgets,
    JournalEntries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Rows of one table, optionally narrowed by `(filter name, value)`.
    Table {
        resource: Resource,
        filter: Option<(&'static str, &'static str)>,
    },
    DisbursementForm,
    Aging,
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Disbursement,
    GeneralLedger,
    PayablesReceivables,
    Collection,
    Budget,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Disbursement,
        Section::GeneralLedger,
        Section::PayablesReceivables,
        Section::Collection,
        Section::Budget,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Disbursement => "Disbursement",
            Section::GeneralLedger => "General Ledger",
            Section::PayablesReceivables => "AP / AR",
            Section::Collection => "Collection",
            Section::Budget => "Budget Management",
        }
    }

    pub fn pages(&self) -> impl Iterator<Item = Page> + '_ {
        Page::ALL.into_iter().filter(move |p| p.section() == *self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    DisbursementRequest,
    PendingDisbursements,
    ApprovedDisbursements,
    RejectedDisbursements,
    DisbursementReports,
    ChartOfAccounts,
    JournalEntry,
    LedgerTable,
    FinancialReports,
    VendorsCustomers,
    Invoices,
    PaymentEntry,
    AgingReports,
    PaymentEntryCollection,
    ReceiptGeneration,
    CollectionDashboard,
    OutstandingBalances,
    CollectionReports,
    BudgetProposal,
    ApprovalWorkflow,
    BudgetVsActual,
    BudgetReports,
}

impl Page {
    pub const ALL: [Page; 22] = [
        Page::DisbursementRequest,
        Page::PendingDisbursements,
        Page::ApprovedDisbursements,
        Page::RejectedDisbursements,
        Page::DisbursementReports,
        Page::ChartOfAccounts,
        Page::JournalEntry,
        Page::LedgerTable,
        Page::FinancialReports,
        Page::VendorsCustomers,
        Page::Invoices,
        Page::PaymentEntry,
        Page::AgingReports,
        Page::PaymentEntryCollection,
        Page::ReceiptGeneration,
        Page::CollectionDashboard,
        Page::OutstandingBalances,
        Page::CollectionReports,
        Page::BudgetProposal,
        Page::ApprovalWorkflow,
        Page::BudgetVsActual,
        Page::BudgetReports,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Page::DisbursementRequest => "disbursement-request",
            Page::PendingDisbursements => "pending-disbursements",
            Page::ApprovedDisbursements => "approved-disbursements",
            Page::RejectedDisbursements => "rejected-disbursements",
            Page::DisbursementReports => "disbursement-reports",
            Page::ChartOfAccounts => "chart-of-accounts",
            Page::JournalEntry => "journal-entry",
            Page::LedgerTable => "ledger-table",
            Page::FinancialReports => "financial-reports",
            Page::VendorsCustomers => "vendors-customers",
            Page::Invoices => "invoices",
            Page::PaymentEntry => "payment-entry",
            Page::AgingReports => "aging-reports",
            Page::PaymentEntryCollection => "payment-entry-collection",
            Page::ReceiptGeneration => "receipt-generation",
            Page::CollectionDashboard => "collection-dashboard",
            Page::OutstandingBalances => "outstanding-balances",
            Page::CollectionReports => "collection-reports",
            Page::BudgetProposal => "budget-proposal",
            Page::ApprovalWorkflow => "approval-workflow",
            Page::BudgetVsActual => "budget-vs-actual",
            Page::BudgetReports => "budget-reports",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::DisbursementRequest => "Disbursement Request",
            Page::PendingDisbursements => "Pending Disbursements",
            Page::ApprovedDisbursements => "Approved Disbursements",
            Page::RejectedDisbursements => "Rejected Disbursements",
            Page::DisbursementReports => "Disbursement Reports",
            Page::ChartOfAccounts => "Chart of Accounts",
            Page::JournalEntry => "Journal Entry",
            Page::LedgerTable => "Ledger Table",
            Page::FinancialReports => "Financial Reports",
            Page::VendorsCustomers => "Vendors/Customers",
            Page::Invoices => "Invoices",
            Page::PaymentEntry | Page::PaymentEntryCollection => "Payment Entry",
            Page::AgingReports => "Aging Reports",
            Page::ReceiptGeneration => "Receipt Generation",
            Page::CollectionDashboard => "Collection Dashboard",
            Page::OutstandingBalances => "Outstanding Balances",
            Page::CollectionReports => "Collection Reports",
            Page::BudgetProposal => "Budget Proposal",
            Page::ApprovalWorkflow => "Approval Workflow",
            Page::BudgetVsActual => "Budget vs Actual",
            Page::BudgetReports => "Budget Reports",
        }
    }

    pub fn section(&self) -> Section {
        match self {
            Page::DisbursementRequest
            | Page::PendingDisbursements
            | Page::ApprovedDisbursements
            | Page::RejectedDisbursements
            | Page::DisbursementReports => Section::Disbursement,
            Page::ChartOfAccounts
            | Page::JournalEntry
            | Page::LedgerTable
            | Page::FinancialReports => Section::GeneralLedger,
            Page::VendorsCustomers | Page::Invoices | Page::PaymentEntry | Page::AgingReports => {
                Section::PayablesReceivables
            }
            Page::PaymentEntryCollection
            | Page::ReceiptGeneration
            | Page::CollectionDashboard
            | Page::OutstandingBalances
            | Page::CollectionReports => Section::Collection,
            Page::BudgetProposal
            | Page::ApprovalWorkflow
            | Page::BudgetVsActual
            | Page::BudgetReports => Section::Budget,
        }
    }

    pub fn view(&self) -> View {
        let table = |resource, filter| View::Table { resource, filter };
        match self {
            Page::DisbursementRequest => View::DisbursementForm,
            Page::PendingDisbursements => table(Resource::Disbursements, Some(("status", "Pending"))),
            Page::ApprovedDisbursements => {
                table(Resource::Disbursements, Some(("status", "Approved")))
            }
            Page::RejectedDisbursements => {
                table(Resource::Disbursements, Some(("status", "Rejected")))
            }
            Page::ChartOfAccounts => table(Resource::Accounts, None),
            Page::JournalEntry => table(Resource::JournalEntries, None),
            Page::LedgerTable => table(Resource::JournalEntries, Some(("status", "Posted"))),
            Page::Invoices => table(Resource::Invoices, None),
            Page::PaymentEntry => table(Resource::Payments, Some(("type", "Send"))),
            Page::PaymentEntryCollection => table(Resource::Payments, Some(("type", "Receive"))),
            Page::OutstandingBalances => table(Resource::Invoices, Some(("status", "Pending"))),
            Page::BudgetProposal => table(Resource::Budgets, None),
            Page::ApprovalWorkflow => table(Resource::Budgets, Some(("status", "Pending"))),
            Page::AgingReports => View::Aging,
            Page::DisbursementReports
            | Page::FinancialReports
            | Page::VendorsCustomers
            | Page::ReceiptGeneration
            | Page::CollectionDashboard
            | Page::CollectionReports
            | Page::BudgetVsActual
            | Page::BudgetReports => View::Placeholder,
        }
    }
}

impl FromStr for Page {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| AppError::NotFound(format!("page '{s}'")))
    }
}

#[derive(Serialize)]
pub struct SidebarItem {
    id: &'static str,
    title: &'static str,
}

#[derive(Serialize)]
pub struct SidebarSection {
    label: &'static str,
    items: Vec<SidebarItem>,
}

pub fn sidebar() -> Vec<SidebarSection> {
    Section::ALL
        .iter()
        .map(|section| SidebarSection {
            label: section.label(),
            items: section
                .pages()
                .map(|p| SidebarItem {
                    id: p.id(),
                    title: p.title(),
                })
                .collect(),
        })
        .collect()
}

/// Error rendered as an on-page notification fragment.
pub struct AppMessage(Response);

impl AppMessage {
    pub fn new_error(err: AppError, s: &AppState) -> AppMessage {
        #[derive(Serialize, Default)]
        struct Ctx {
            info: Option<String>,
            error: Option<String>,
        }

        let status = err.status_code();
        if status.is_server_error() {
            log::error!("cannot render page: {err}");
        }

        let ctx = Ctx {
            error: Some(err.public_message()),
            ..Default::default()
        };

        let body = match s.t.render("base.notification.hbs", &ctx) {
            Ok(html) => html,
            Err(render_err) => {
                log::error!("cannot render notification: {render_err}");
                err.public_message().into_response()
            }
        };
        Self((status, body).into_response())
    }
}

impl IntoResponse for AppMessage {
    fn into_response(self) -> Response {
        self.0
    }
}

pub fn new_router() -> Router<AppState> {
    Router::new().route("/:page", get(get_page))
}

#[axum::debug_handler(state = AppState)]
async fn get_page(
    State(s): State<AppState>,
    _user: SessionUser,
    Path(page): Path<String>,
) -> Result<Response, AppMessage> {
    render_page(&s, &page)
        .await
        .map_err(|err| AppMessage::new_error(err, &s))
}

#[derive(Serialize)]
struct PageCtx<T: Serialize> {
    id: &'static str,
    title: &'static str,
    section: &'static str,
    data: T,
}

impl<T: Serialize> PageCtx<T> {
    fn new(page: Page, data: T) -> Self {
        Self {
            id: page.id(),
            title: page.title(),
            section: page.section().label(),
            data,
        }
    }
}

async fn render_page(s: &AppState, id: &str) -> AppResult<Response> {
    let page: Page = id.parse()?;
    let ctx = |data| PageCtx::new(page, data);

    match page.view() {
        View::Table { resource, filter } => {
            let table = resource_table(s, resource, filter).await?;
            s.t.render("page.table.hbs", &ctx(table))
        }
        View::DisbursementForm => {
            let table = resource_table(s, Resource::Disbursements, None).await?;
            s.t.render("page.disbursement_form.hbs", &ctx(table))
        }
        View::Aging => {
            let report = aging::aging_report(&s.p, chrono::Local::now().date_naive()).await?;
            s.t.render("page.aging.hbs", &PageCtx::new(page, report))
        }
        View::Placeholder => s.t.render("page.placeholder.hbs", &PageCtx::new(page, ())),
    }
}

async fn resource_table(
    s: &AppState,
    resource: Resource,
    filter: Option<(&'static str, &'static str)>,
) -> AppResult<TableComponent> {
    match resource {
        Resource::Accounts => table_of::<models::Account>(s, filter).await,
        Resource::Disbursements => table_of::<models::DisbursementRequest>(s, filter).await,
        Resource::Invoices => table_of::<models::Invoice>(s, filter).await,
        Resource::Payments => table_of::<models::Payment>(s, filter).await,
        Resource::Budgets => table_of::<models::Budget>(s, filter).await,
        Resource::JournalEntries => table_of::<models::JournalEntry>(s, filter).await,
    }
}

async fn table_of<T: Listing>(
    s: &AppState,
    filter: Option<(&'static str, &'static str)>,
) -> AppResult<TableComponent> {
    let filter = filter
        .map(|(name, value)| ListFilter::for_listing::<T>(name, value))
        .transpose()?;
    let rows = listing::list::<T>(&s.p, filter.as_ref()).await?;
    TableComponent::new(&rows).map_err(|err| AppError::Internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn page_ids_resolve_to_pages() {
        assert_eq!("pending-disbursements".parse::<Page>().unwrap(), Page::PendingDisbursements);
        assert_eq!("aging-reports".parse::<Page>().unwrap(), Page::AgingReports);
    }

    #[test]
    fn unknown_page_is_not_found() {
        let err = "payroll".parse::<Page>().unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn page_ids_are_unique() {
        let mut ids: Vec<&str> = Page::ALL.iter().map(Page::id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Page::ALL.len());
    }

    #[test]
    fn sidebar_lists_every_page_once() {
        let total: usize = sidebar().iter().map(|s| s.items.len()).sum();
        assert_eq!(total, Page::ALL.len());
        assert_eq!(sidebar()[0].items[1].id, "pending-disbursements");
    }

    #[test]
    fn status_pages_filter_disbursements() {
        assert_eq!(
            Page::RejectedDisbursements.view(),
            View::Table {
                resource: Resource::Disbursements,
                filter: Some(("status", "Rejected")),
            }
        );
    }

    #[test]
    fn table_filters_name_real_columns() {
        for page in Page::ALL {
            if let View::Table {
                resource,
                filter: Some((name, value)),
            } = page.view()
            {
                let ok = match resource {
                    Resource::Accounts => ListFilter::for_listing::<models::Account>(name, value),
                    Resource::Disbursements => {
                        ListFilter::for_listing::<models::DisbursementRequest>(name, value)
                    }
                    Resource::Invoices => ListFilter::for_listing::<models::Invoice>(name, value),
                    Resource::Payments => ListFilter::for_listing::<models::Payment>(name, value),
                    Resource::Budgets => ListFilter::for_listing::<models::Budget>(name, value),
                    Resource::JournalEntries => {
                        ListFilter::for_listing::<models::JournalEntry>(name, value)
                    }
                };
                assert!(ok.is_ok(), "{} filters on unknown column {name}", page.id());
            }
        }
    }
}
