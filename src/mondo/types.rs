use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

// https://getmondo.co.uk/docs/#list-accounts
#[derive(Debug, Deserialize)]
pub struct MondoAccount {
    pub id: String,
    pub description: String,
    pub created: DateTime<Utc>,
}

// https://getmondo.co.uk/docs/#read-balance
#[derive(Debug, Deserialize)]
pub struct MondoBalance {
    pub balance: i64,
    pub currency: String,
    pub spend_today: i64,
}

// https://getmondo.co.uk/docs/#list-transactions
#[derive(Debug, Deserialize)]
pub struct MondoTransaction {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub created: DateTime<Utc>,
    /// Empty string until the transaction settles
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub settled: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merchant: Option<MondoMerchantRef>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_load: bool,
    #[serde(default)]
    pub account_balance: Option<i64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// The API returns a bare merchant id unless `expand[]=merchant` was requested.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MondoMerchantRef {
    Id(String),
    Expanded(Box<MondoMerchant>),
}

#[derive(Debug, Deserialize)]
pub struct MondoMerchant {
    pub id: String,
    #[serde(default)]
    pub group_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: Option<MondoAddress>,
}

#[derive(Debug, Deserialize)]
pub struct MondoAddress {
    #[serde(default)]
    pub short_formatted: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

// https://getmondo.co.uk/docs/#authenticating-requests
#[derive(Debug, Deserialize)]
pub struct MondoWhoAmI {
    pub authenticated: bool,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct MondoErrorBody {
    #[serde(default)]
    pub(super) code: Option<String>,
    #[serde(default)]
    pub(super) message: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsettled_transaction() {
        let tx: MondoTransaction = serde_json::from_str(
            r#"{
                "id": "tx_1",
                "amount": -510,
                "currency": "GBP",
                "description": "THE DE BEAUVOIR DELI C LONDON GBR",
                "created": "2015-08-22T12:20:18Z",
                "settled": "",
                "merchant": "merch_1"
            }"#,
        )
        .unwrap();

        assert!(tx.settled.is_none());
        assert!(matches!(tx.merchant, Some(MondoMerchantRef::Id(ref id)) if id == "merch_1"));
    }

    #[test]
    fn test_expanded_merchant() {
        let tx: MondoTransaction = serde_json::from_str(
            r#"{
                "id": "tx_1",
                "amount": -510,
                "currency": "GBP",
                "description": "deli",
                "created": "2015-08-22T12:20:18Z",
                "settled": "2015-08-23T12:20:18Z",
                "merchant": {
                    "id": "merch_1",
                    "group_id": "grp_1",
                    "name": "The De Beauvoir Deli Co.",
                    "category": "eating_out",
                    "emoji": "🍞",
                    "address": { "city": "London", "country": "GB", "latitude": 51.54, "longitude": -0.08 }
                },
                "metadata": { "note": "lunch" }
            }"#,
        )
        .unwrap();

        let Some(MondoMerchantRef::Expanded(merchant)) = tx.merchant else {
            panic!("expected expanded merchant");
        };
        assert_eq!(merchant.name, "The De Beauvoir Deli Co.");
        assert_eq!(merchant.address.unwrap().city.as_deref(), Some("London"));
        assert!(tx.settled.is_some());
        assert_eq!(tx.metadata.len(), 1);
    }
}
