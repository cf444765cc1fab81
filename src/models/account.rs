use crate::mondo::types::MondoAccount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    pub description: String,
    pub created: DateTime<Utc>,
}

impl From<MondoAccount> for Account {
    fn from(mondo: MondoAccount) -> Self {
        Account {
            id: mondo.id,
            description: mondo.description,
            created: mondo.created,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn mock_account() -> Account {
        Account {
            id: "acc_1".to_string(),
            description: "Current".to_string(),
            created: Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_account() {
        let wire: MondoAccount = serde_json::from_str(
            r#"{"id":"acc_1","description":"Current","created":"2016-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let account = Account::from(wire);

        assert_eq!(account, test_helpers::mock_account());
    }

    #[test]
    fn test_account_id_survives_reencode() {
        let wire: MondoAccount = serde_json::from_str(
            r#"{"id":"acc_00009237aqC8c5umZmrRdh","description":"Peter Pan's Account","created":"2015-11-13T12:17:42.102Z"}"#,
        )
        .unwrap();
        let account = Account::from(wire);

        let json = serde_json::to_string(&account).unwrap();
        let deserialized: Account = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.id, "acc_00009237aqC8c5umZmrRdh");
        assert_eq!(account, deserialized);
    }
}
