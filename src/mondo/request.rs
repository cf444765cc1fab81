use crate::error::{AppError, Result};
use crate::models::Pagination;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint<'a> {
    Accounts,
    Balance { account_id: &'a str },
    Transactions { account_id: &'a str, expand_merchant: bool },
    WhoAmI,
}

impl Endpoint<'_> {
    pub fn method(&self) -> Method {
        Method::GET
    }

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Accounts => "/accounts",
            Endpoint::Balance { .. } => "/balance",
            Endpoint::Transactions { .. } => "/transactions",
            Endpoint::WhoAmI => "/ping/whoami",
        }
    }

    fn params(&self) -> Vec<(String, String)> {
        match *self {
            Endpoint::Accounts | Endpoint::WhoAmI => Vec::new(),
            Endpoint::Balance { account_id } => {
                vec![("account_id".to_string(), account_id.to_string())]
            }
            Endpoint::Transactions {
                account_id,
                expand_merchant,
            } => {
                let mut params = vec![("account_id".to_string(), account_id.to_string())];
                if expand_merchant {
                    params.push(("expand[]".to_string(), "merchant".to_string()));
                }
                params
            }
        }
    }
}

/// Everything needed to issue one API call, independent of any HTTP client.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn into_request(
        self,
        client: &reqwest::Client,
        base_url: &str,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", base_url.trim_end_matches('/'), self.path);
        client
            .request(self.method, url)
            .headers(self.headers)
            .query(&self.query)
    }
}

/// Build a request for `endpoint`.
///
/// Parameters are layered endpoint, then caller, then pagination. Pagination
/// overwrites a caller key; the endpoint's own keys are never overwritten.
pub fn build(
    endpoint: Endpoint<'_>,
    access_token: Option<&str>,
    params: &[(String, String)],
    pagination: Option<&Pagination>,
) -> Result<RequestDescriptor> {
    let mut query = endpoint.params();
    let reserved: Vec<String> = query.iter().map(|(k, _)| k.clone()).collect();

    let mut extra: Vec<(String, String)> = Vec::new();
    for (key, value) in params {
        upsert(&mut extra, key, value);
    }
    if let Some(pagination) = pagination {
        for (key, value) in pagination.to_query() {
            upsert(&mut extra, &key, &value);
        }
    }
    for (key, value) in extra {
        if reserved.contains(&key) {
            warn!(key = %key, "Ignoring parameter that overrides the endpoint");
            continue;
        }
        query.push((key, value));
    }

    let mut headers = HeaderMap::new();
    if let Some(token) = access_token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| AppError::Auth(format!("Invalid access token: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(RequestDescriptor {
        method: endpoint.method(),
        path: endpoint.path().to_string(),
        query,
        headers,
    })
}

fn upsert(query: &mut Vec<(String, String)>, key: &str, value: &str) {
    match query.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => query.push((key.to_string(), value.to_string())),
    }
}
