//! Administrative console: a typed client for the HTTP API and the list views
//! an operator works with (fetch, show a banner or a table, act, re-fetch).

pub mod client;
pub mod view;

pub use client::{ApiClient, ClientError};
pub use view::{render, LoanAction, LoanBoard, TableRow, ViewState, LOAD_FAILED, UPDATE_FAILED};
