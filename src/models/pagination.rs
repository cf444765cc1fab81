use chrono::{DateTime, SecondsFormat, Utc};

/// Lower bound for cursor-based paging.
#[derive(Debug, Clone, PartialEq)]
pub enum Since {
    Date(DateTime<Utc>),
    /// Opaque transaction id; results start after it
    TransactionId(String),
}

impl Since {
    /// Parses an RFC 3339 timestamp, falling back to treating the input as an id.
    pub fn parse(value: &str) -> Self {
        match DateTime::parse_from_rfc3339(value) {
            Ok(dt) => Since::Date(dt.with_timezone(&Utc)),
            Err(_) => Since::TransactionId(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub since: Option<Since>,
    pub before: Option<DateTime<Utc>>,
}

impl Pagination {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn since(mut self, since: Since) -> Self {
        self.since = Some(since);
        self
    }

    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(since) = &self.since {
            let value = match since {
                Since::Date(dt) => format_timestamp(dt),
                Since::TransactionId(id) => id.clone(),
            };
            params.push(("since".to_string(), value));
        }
        if let Some(before) = &self.before {
            params.push(("before".to_string(), format_timestamp(before)));
        }

        params
    }
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
