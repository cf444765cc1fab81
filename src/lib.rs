//! Client for the Mondo banking API: accounts, balances and transactions,
//! plus the OAuth2 authorization-code flow used to obtain access tokens.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod mondo;

pub use error::{AppError, Result};
pub use mondo::{MondoClient, MondoOperations, Session};
