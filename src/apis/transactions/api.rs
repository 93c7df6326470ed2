use crate::{
    apis::{
        transactions::{ListTransactionsRequest, TransactionDetails, TransactionList},
        MyPosClientInner,
    },
    executor::RequestDescriptor,
    Error,
};
use std::sync::Arc;
use urlencoding::encode;

/// myPOS Transactions APIs client.
#[derive(Clone, Debug)]
pub struct TransactionsApi {
    inner: Arc<MyPosClientInner>,
}

impl TransactionsApi {
    pub(crate) fn new(inner: Arc<MyPosClientInner>) -> Self {
        Self { inner }
    }

    /// Lists the transactions of the merchant, most recent first.
    ///
    /// Use `last_transaction_id` to continue from the last transaction of a previous page.
    #[tracing::instrument(
        name = "List Transactions",
        skip(self, request),
        fields(size = request.size)
    )]
    pub async fn list(&self, request: &ListTransactionsRequest) -> Result<TransactionList, Error> {
        let descriptor = RequestDescriptor::get("/v1/transactions")
            .with_query("size", request.size)
            .with_json_body(request)?;

        self.inner.executor.execute_json(&descriptor).await
    }

    /// Gets the details of a single transaction by its payment reference.
    #[tracing::instrument(name = "Get Transaction Details", skip(self))]
    pub async fn get_details(&self, payment_reference: &str) -> Result<TransactionDetails, Error> {
        let descriptor =
            RequestDescriptor::get(format!("/v1/transactions/{}", encode(payment_reference)));

        self.inner.executor.execute_json(&descriptor).await
    }
}
