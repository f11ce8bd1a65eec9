use std::fmt::Display;

use tracing::warn;

use crate::console::client::ApiClient;
use crate::db::models::{LoanWithUsername, OrderWithUsername, Product, WeatherAlert};
use crate::models::LoanStatus;

pub const LOAD_FAILED: &str = "Failed to load loans";
pub const UPDATE_FAILED: &str = "Failed to update loan status";

/// What a list view shows at a given moment.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Failed(String),
    Ready { rows: Vec<T>, banner: Option<String> },
}

impl<T> ViewState<T> {
    pub fn from_fetch<E: Display>(result: Result<Vec<T>, E>, failure: &str) -> Self {
        match result {
            Ok(rows) => ViewState::Ready { rows, banner: None },
            Err(e) => {
                warn!(error = %e, "{failure}");
                ViewState::Failed(failure.to_string())
            }
        }
    }

    pub fn rows(&self) -> &[T] {
        match self {
            ViewState::Ready { rows, .. } => rows,
            _ => &[],
        }
    }

    pub fn banner(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message.as_str()),
            ViewState::Ready { banner, .. } => banner.as_deref(),
            ViewState::Loading => None,
        }
    }

    /// Shows `message` above whatever is already on screen.
    pub fn flag(&mut self, message: &str) {
        match self {
            ViewState::Ready { banner, .. } => *banner = Some(message.to_string()),
            _ => *self = ViewState::Failed(message.to_string()),
        }
    }
}

/// A record that can be shown as one table line.
pub trait TableRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl TableRow for LoanWithUsername {
    const HEADERS: &'static [&'static str] = &[
        "Farmer",
        "Amount",
        "Interest Rate",
        "Term (Months)",
        "Status",
        "Applied On",
        "Actions",
    ];

    fn cells(&self) -> Vec<String> {
        let actions: Vec<&str> = LoanAction::available(self)
            .iter()
            .map(|a| a.label())
            .collect();
        vec![
            self.username.clone(),
            format!("{:.2}", self.loan.amount),
            format!("{}%", self.loan.interest_rate),
            self.loan.term_months.to_string(),
            self.loan.status.clone(),
            self.loan.created_at.format("%Y-%m-%d").to_string(),
            if actions.is_empty() {
                "-".to_string()
            } else {
                actions.join(" / ")
            },
        ]
    }
}

impl TableRow for OrderWithUsername {
    const HEADERS: &'static [&'static str] = &["Order", "Customer", "Total", "Status", "Placed On"];

    fn cells(&self) -> Vec<String> {
        vec![
            format!("#{}", self.order.id),
            self.username.clone(),
            format!("{:.2}", self.order.total_amount),
            self.order.status.clone(),
            self.order.created_at.format("%Y-%m-%d").to_string(),
        ]
    }
}

impl TableRow for Product {
    const HEADERS: &'static [&'static str] = &["Name", "Category", "Price", "Stock"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.category.clone(),
            format!("{:.2}", self.price),
            self.stock.to_string(),
        ]
    }
}

impl TableRow for WeatherAlert {
    const HEADERS: &'static [&'static str] = &["Type", "Severity", "From", "Until", "Description"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.alert_type.clone(),
            self.severity.clone(),
            self.start_date.format("%Y-%m-%d %H:%M").to_string(),
            self.end_date.format("%Y-%m-%d %H:%M").to_string(),
            self.description.clone(),
        ]
    }
}

/// Renders a view as plain text: a loading line, a banner, and/or a table.
pub fn render<T: TableRow>(state: &ViewState<T>, noun: &str) -> String {
    let mut out = String::new();
    if let ViewState::Loading = state {
        out.push_str(&format!("Loading {noun}...\n"));
        return out;
    }
    if let Some(banner) = state.banner() {
        out.push_str(&format!("! {banner}\n"));
    }
    if let ViewState::Ready { rows, .. } = state {
        if rows.is_empty() {
            out.push_str(&format!("No {noun} found.\n"));
        } else {
            let cells: Vec<Vec<String>> = rows.iter().map(|row| row.cells()).collect();
            out.push_str(&render_table(T::HEADERS, &cells));
        }
    }
    out
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        format!("{}\n", padded.join(" | ").trim_end())
    };

    let mut out = line(headers.to_vec());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("-+-")));
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Approve,
    Reject,
}

impl LoanAction {
    /// Only pending applications can be decided.
    pub fn available(loan: &LoanWithUsername) -> &'static [LoanAction] {
        if loan.loan.status == LoanStatus::Pending.as_str() {
            &[LoanAction::Approve, LoanAction::Reject]
        } else {
            &[]
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanAction::Approve => "approve",
            LoanAction::Reject => "reject",
        }
    }

    pub fn target_status(&self) -> LoanStatus {
        match self {
            LoanAction::Approve => LoanStatus::Approved,
            LoanAction::Reject => LoanStatus::Rejected,
        }
    }
}

/// The loan applications screen. Every action is followed by a full re-fetch.
pub struct LoanBoard {
    client: ApiClient,
    state: ViewState<LoanWithUsername>,
}

impl LoanBoard {
    pub fn new(client: ApiClient) -> Self {
        LoanBoard {
            client,
            state: ViewState::Loading,
        }
    }

    pub fn state(&self) -> &ViewState<LoanWithUsername> {
        &self.state
    }

    pub async fn refresh(&mut self) {
        let fetched = self.client.admin_loans().await;
        self.state = ViewState::from_fetch(fetched, LOAD_FAILED);
    }

    pub async fn approve(&mut self, loan_id: i32) {
        self.act(loan_id, LoanAction::Approve).await
    }

    pub async fn reject(&mut self, loan_id: i32) {
        self.act(loan_id, LoanAction::Reject).await
    }

    pub async fn act(&mut self, loan_id: i32, action: LoanAction) {
        match self
            .client
            .update_loan_status(loan_id, action.target_status())
            .await
        {
            Ok(()) => self.refresh().await,
            Err(e) => {
                warn!(loan_id, error = %e, "loan decision failed");
                self.state.flag(UPDATE_FAILED);
            }
        }
    }

    pub fn render(&self) -> String {
        render(&self.state, "loans")
    }
}
