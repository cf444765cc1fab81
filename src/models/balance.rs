use super::minor_to_major;
use crate::mondo::types::MondoBalance;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance snapshot. Amounts are in minor units of `currency`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountBalance {
    pub balance: i64,
    pub currency: String,
    pub spend_today: i64,
}

impl AccountBalance {
    pub fn balance_major(&self) -> Decimal {
        minor_to_major(self.balance)
    }

    pub fn spend_today_major(&self) -> Decimal {
        minor_to_major(self.spend_today)
    }
}

impl From<MondoBalance> for AccountBalance {
    fn from(mondo: MondoBalance) -> Self {
        AccountBalance {
            balance: mondo.balance,
            currency: mondo.currency,
            spend_today: mondo.spend_today,
        }
    }
}
