//! REST API module
//!
//! HTTP surface over [`MultisigService`](crate::service::MultisigService).
//!
//! # Endpoints
//!
//! ## Accounts
//! - `POST /api/accounts` - Create a threshold account
//! - `GET /api/accounts` - List accounts
//! - `GET /api/accounts/{id}` - Get account
//! - `POST /api/accounts/{id}/refresh` - Refresh cached balance
//!
//! ## Transactions
//! - `POST /api/transactions` - Create pending transaction
//! - `GET /api/transactions?account=` - List transactions
//! - `GET /api/transactions/{id}` - Get transaction
//! - `GET /api/transactions/{id}/sign-doc` - Document members sign
//! - `POST /api/transactions/{id}/signatures` - Submit a member signature
//! - `POST /api/transactions/{id}/broadcast` - Broadcast a ready transaction
//!
//! ## Proposals
//! - `POST /api/proposals` - Open proposal
//! - `GET /api/proposals?account=` - List proposals
//! - `GET /api/proposals/{id}` - Get proposal
//! - `POST /api/proposals/{id}/votes` - Vote
//! - `POST /api/proposals/{id}/execute` - Execute passed proposal
//!
//! ## Maintenance
//! - `POST /api/maintenance/cleanup` - Sweep expired entities
//!
//! Errors are returned as `{"error", "kind", "violations"}` with a status
//! matching the error kind.

pub mod handlers;
pub mod routes;

pub use handlers::{error_response, ApiError, ApiState};
pub use routes::create_router;
