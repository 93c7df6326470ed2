//! Rust client for the [myPOS](https://www.mypos.com) merchant APIs.
//!
//! The client takes care of authentication: it obtains an access token through the
//! OAuth client credentials grant, attaches it to every request, and replaces it once
//! when the API reports it as expired. It also verifies the signature of webhook
//! notifications sent by myPOS.
//!
//! # Usage
//!
//! ## Initialize a new `MyPosClient`
//!
//! Create a new [`MyPosClient`](crate::client::MyPosClient) and provide your client ID and client secret.
//!
//! ```rust,no_run
//! # use mypos_rust::{MyPosClient, apis::auth::Credentials};
//! # #[tokio::main]
//! # async fn main() {
//! let client = MyPosClient::builder(Credentials::new("some-client-id", "some-client-secret"))
//!     .build();
//! # }
//! ```
//!
//! By default, a `MyPosClient` connects to the Live environment. Use
//! [`with_environment`](crate::client::MyPosClientBuilder::with_environment) to point it elsewhere,
//! or [`ClientConfig::from_env`](crate::config::ClientConfig::from_env) to read the settings
//! from `MYPOS_*` environment variables.
//!
//! `build()` sends no request: the first access token is fetched on first use. Use
//! [`connect()`](crate::client::MyPosClientBuilder::connect) instead to validate the credentials upfront.
//!
//! ## List transactions
//!
//! ```rust,no_run
//! # use mypos_rust::{MyPosClient, Error, apis::transactions::*};
//! #
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! # let client: MyPosClient = unreachable!();
//! #
//! let request = ListTransactionsRequestBuilder::default()
//!     .size(50u32)
//!     .transaction_types(vec![TransactionType::PosPurchase])
//!     .build()
//!     .unwrap();
//!
//! let res = client.transactions.list(&request).await?;
//! for transaction in &res.transactions {
//!     tracing::info!(
//!         "{}: {} {}",
//!         transaction.payment_reference,
//!         transaction.transaction_amount,
//!         transaction.transaction_currency
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Verify a webhook notification
//!
//! ```rust
//! # use mypos_rust::signature::SignatureVerifier;
//! # let body = br#"{"event": "payment_received"}"#;
//! # let signature_header = SignatureVerifier::new().sign(body, b"webhook-secret", chrono::Utc::now().timestamp());
//! let verifier = SignatureVerifier::new();
//!
//! if verifier.verify(body, Some(&signature_header), b"webhook-secret") {
//!     // Process the notification
//! }
//! ```
//!
//! ## More examples
//!
//! Look into the [`demos`](../demos) for more example usages of this library.
//!
//! To run an example, use `cargo run` like this:
//!
//! ```shell
//! cargo run --example list_transactions
//! ```

#![deny(missing_debug_implementations)]
#![forbid(unsafe_code)]

pub mod apis;
pub(crate) mod authenticator;
pub mod client;
mod common;
pub mod config;
pub mod error;
pub mod executor;
mod middlewares;
pub mod signature;

pub use client::MyPosClient;
pub use error::Error;
pub use signature::SignatureVerifier;
