use super::minor_to_major;
use crate::error::{AppError, Result};
use crate::mondo::types::{MondoAddress, MondoMerchant, MondoMerchantRef, MondoTransaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    /// Minor units; negative for debits
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub merchant: Option<MerchantRef>,
    pub created: DateTime<Utc>,
    pub settled: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub is_load: bool,
    pub account_balance: Option<i64>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Transaction {
    pub fn amount_major(&self) -> Decimal {
        minor_to_major(self.amount)
    }

    pub fn merchant_name(&self) -> Option<&str> {
        match &self.merchant {
            Some(MerchantRef::Expanded(merchant)) => Some(&merchant.name),
            _ => None,
        }
    }
}

impl From<MondoTransaction> for Transaction {
    fn from(mondo: MondoTransaction) -> Self {
        Transaction {
            id: mondo.id,
            amount: mondo.amount,
            currency: mondo.currency,
            description: mondo.description,
            merchant: mondo.merchant.map(Into::into),
            created: mondo.created,
            settled: mondo.settled,
            category: mondo.category,
            notes: mondo.notes.filter(|n| !n.is_empty()),
            is_load: mondo.is_load,
            account_balance: mondo.account_balance,
            metadata: mondo.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MerchantRef {
    Id(String),
    Expanded(Merchant),
}

impl MerchantRef {
    pub fn id(&self) -> &str {
        match self {
            MerchantRef::Id(id) => id,
            MerchantRef::Expanded(merchant) => &merchant.id,
        }
    }
}

impl From<MondoMerchantRef> for MerchantRef {
    fn from(mondo: MondoMerchantRef) -> Self {
        match mondo {
            MondoMerchantRef::Id(id) => MerchantRef::Id(id),
            MondoMerchantRef::Expanded(merchant) => MerchantRef::Expanded((*merchant).into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Merchant {
    pub id: String,
    pub group_id: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub logo: Option<String>,
    pub emoji: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub address: Option<MerchantAddress>,
}

impl From<MondoMerchant> for Merchant {
    fn from(mondo: MondoMerchant) -> Self {
        Merchant {
            id: mondo.id,
            group_id: mondo.group_id,
            name: mondo.name,
            category: mondo.category,
            logo: mondo.logo,
            emoji: mondo.emoji,
            created: mondo.created,
            address: mondo.address.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MerchantAddress {
    pub short_formatted: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<MondoAddress> for MerchantAddress {
    fn from(mondo: MondoAddress) -> Self {
        MerchantAddress {
            short_formatted: mondo.short_formatted,
            address: mondo.address,
            city: mondo.city,
            country: mondo.country,
            postcode: mondo.postcode,
            latitude: mondo.latitude,
            longitude: mondo.longitude,
        }
    }
}

pub trait ToCsv {
    /// Render as CSV, always including a header row.
    fn to_csv(&self) -> Result<String>;
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CsvRow<'a> {
    created: DateTime<Utc>,
    settled: Option<DateTime<Utc>>,
    description: &'a str,
    merchant: Option<&'a str>,
    category: Option<&'a str>,
    amount: Decimal,
    currency: &'a str,
    #[serde(rename = "ID")]
    id: &'a str,
}

impl<'a> From<&'a Transaction> for CsvRow<'a> {
    fn from(t: &'a Transaction) -> Self {
        CsvRow {
            created: t.created,
            settled: t.settled,
            description: &t.description,
            merchant: t.merchant_name(),
            category: t.category.as_deref(),
            amount: t.amount_major(),
            currency: &t.currency,
            id: &t.id,
        }
    }
}

const CSV_HEADERS: &[&str] = &[
    "Created",
    "Settled",
    "Description",
    "Merchant",
    "Category",
    "Amount",
    "Currency",
    "ID",
];

impl ToCsv for [Transaction] {
    fn to_csv(&self) -> Result<String> {
        // Headers are written explicitly so an empty slice still produces them
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);

        writer
            .write_record(CSV_HEADERS)
            .map_err(|e| AppError::Other(e.into()))?;
        for t in self {
            writer
                .serialize(CsvRow::from(t))
                .map_err(|e| AppError::Other(e.into()))?;
        }

        let data = writer
            .into_inner()
            .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to get CSV data: {}", e)))?;
        String::from_utf8(data).map_err(|e| AppError::Other(e.into()))
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn mock_datetime(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()
    }

    pub(crate) fn mock_transaction(id: &str, amount: i64, created: DateTime<Utc>) -> Transaction {
        Transaction {
            id: id.to_string(),
            amount,
            currency: "GBP".to_string(),
            description: format!("mock transaction: {id}"),
            merchant: None,
            created,
            settled: None,
            category: None,
            notes: None,
            is_load: false,
            account_balance: None,
            metadata: BTreeMap::new(),
        }
    }
}
