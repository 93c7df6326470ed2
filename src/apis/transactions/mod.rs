//! APIs and models related to account transactions.

mod api;
mod model;

pub use api::TransactionsApi;
pub use model::*;
