use super::types::MondoErrorBody;
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Any status other than 200 becomes an `Api` error carrying the server's message.
pub fn check_status(status: u16, body: &str) -> Result<()> {
    if status == 200 {
        return Ok(());
    }

    let error: MondoErrorBody = serde_json::from_str(body).unwrap_or_default();
    if let Some(code) = &error.code {
        debug!(status, code = %code, "Mondo API returned an error");
    }

    Err(AppError::Api {
        status,
        message: error.message.unwrap_or_default(),
    })
}

/// Decode a single-object response. A schema mismatch fails the call.
pub fn decode_object<W, T>(status: u16, body: &str) -> Result<T>
where
    W: DeserializeOwned,
    T: From<W>,
{
    check_status(status, body)?;

    let wire: W = serde_json::from_str(body).map_err(|e| AppError::Decode(e.to_string()))?;
    Ok(wire.into())
}

/// Decode a list wrapped in `{ "<key>": [...] }`.
///
/// Elements that fail to decode are logged and left out of the result.
pub fn decode_list<W, T>(status: u16, body: &str, key: &str) -> Result<Vec<T>>
where
    W: DeserializeOwned,
    T: From<W>,
{
    check_status(status, body)?;

    let mut envelope: serde_json::Value =
        serde_json::from_str(body).map_err(|e| AppError::Decode(e.to_string()))?;
    let items = match envelope.get_mut(key).map(serde_json::Value::take) {
        Some(serde_json::Value::Array(items)) => items,
        Some(_) => {
            return Err(AppError::Decode(format!("`{}` is not an array", key)));
        }
        None => return Err(AppError::Decode(format!("missing `{}` in response", key))),
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<W>(item) {
            Ok(wire) => Some(wire.into()),
            Err(e) => {
                warn!(key, index = idx, error = %e, "Skipping malformed element");
                None
            }
        })
        .collect();

    debug!(key, total, decoded = decoded.len(), "Decoded list response");
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, AccountBalance};
    use crate::mondo::types::{MondoAccount, MondoBalance};

    #[test]
    fn test_malformed_account_skipped() {
        let body = r#"{"accounts": [
            {"id":"acc_1","description":"Current","created":"2016-01-01T00:00:00Z"},
            {"id":"acc_2","created":"2016-01-01T00:00:00Z"},
            {"id":"acc_3","description":"Joint","created":"not a date"},
            {"id":"acc_4","description":"Savings","created":"2016-02-01T00:00:00Z"}
        ]}"#;

        let accounts = decode_list::<MondoAccount, Account>(200, body, "accounts").unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].id, "acc_1");
        assert_eq!(accounts[1].id, "acc_4");
    }

    #[test]
    fn test_missing_envelope_key() {
        let result = decode_list::<MondoAccount, Account>(200, r#"{"other": []}"#, "accounts");
        assert!(matches!(result, Err(AppError::Decode(_))));
    }

    #[test]
    fn test_non_200_is_api_error() {
        for status in [201, 400, 401, 403, 404, 500] {
            let result = decode_list::<MondoAccount, Account>(
                status,
                r#"{"code":"unauthorized","message":"Access token is invalid"}"#,
                "accounts",
            );
            match result {
                Err(AppError::Api {
                    status: code,
                    message,
                }) => {
                    assert_eq!(code, status);
                    assert_eq!(message, "Access token is invalid");
                }
                other => panic!("expected Api error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_api_error_without_message() {
        let result = decode_object::<MondoBalance, AccountBalance>(502, "<html>bad gateway</html>");
        match result {
            Err(AppError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_balance_is_decode_error() {
        let result =
            decode_object::<MondoBalance, AccountBalance>(200, r#"{"balance":"lots"}"#);
        assert!(matches!(result, Err(AppError::Decode(_))));
    }

    #[test]
    fn test_decode_balance() {
        let balance = decode_object::<MondoBalance, AccountBalance>(
            200,
            r#"{"balance":5000,"currency":"GBP","spend_today":-250}"#,
        )
        .unwrap();
        assert_eq!(
            balance,
            AccountBalance {
                balance: 5000,
                currency: "GBP".to_string(),
                spend_today: -250,
            }
        );
    }
}
