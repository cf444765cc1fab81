pub mod account;
pub mod balance;
pub mod pagination;
pub mod transaction;
pub mod whoami;

pub use account::Account;
pub use balance::AccountBalance;
pub use pagination::{Pagination, Since};
pub use transaction::{Merchant, MerchantAddress, MerchantRef, ToCsv, Transaction};
pub use whoami::WhoAmI;

use rust_decimal::Decimal;

/// Converts an amount in minor units (pence, cents) into major units.
pub fn minor_to_major(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
