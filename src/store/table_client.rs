use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, instrument};

use crate::store::StoreError;

/// A row as sent to the table store: column name -> JSON value
pub type Row = Map<String, Value>;

/// Insert/delete operations of a remote table store
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Insert all rows in a single call
    async fn insert(&self, table: &str, rows: &[Row]) -> Result<(), StoreError>;

    /// Delete every row matching `filter`, returning how many were deleted
    async fn delete(&self, table: &str, filter: &Filter) -> Result<usize, StoreError>;
}

/// A single-column comparison, e.g. `year > 0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    column: String,
    op: &'static str,
    value: String,
}

impl Filter {
    fn new(column: impl Into<String>, op: &'static str, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.to_string(),
        }
    }

    pub fn equals(column: impl Into<String>, value: impl ToString) -> Self {
        Self::new(column, "eq", value)
    }

    pub fn gt(column: impl Into<String>, value: impl ToString) -> Self {
        Self::new(column, "gt", value)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// PostgREST query value, e.g. `gt.0`
    pub fn query_value(&self) -> String {
        format!("{}.{}", self.op, self.value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column, self.query_value())
    }
}

/// REST client for a Supabase (PostgREST) project
#[derive(Clone)]
pub struct TableClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TableClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check_status(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl TableStore for TableClient {
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert(&self, table: &str, rows: &[Row]) -> Result<(), StoreError> {
        debug!("Inserting {} rows into {}", rows.len(), table);
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(rows);

        let response = self.authorized(request).send().await?;
        debug!("Received HTTP response with status: {}", response.status());
        Self::check_status(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, table: &str, filter: &Filter) -> Result<usize, StoreError> {
        debug!("Deleting rows from {} where {}", table, filter);
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[(filter.column(), filter.query_value())])
            .header("Prefer", "return=representation");

        let response = self.authorized(request).send().await?;
        debug!("Received HTTP response with status: {}", response.status());
        let response = Self::check_status(response).await?;

        let body = response.text().await?;
        let deleted: Vec<Value> = serde_json::from_str(&body)?;
        Ok(deleted.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_query_value() {
        let filter = Filter::gt("year", 0);
        assert_eq!(filter.column(), "year");
        assert_eq!(filter.query_value(), "gt.0");
        assert_eq!(filter.to_string(), "year=gt.0");
        assert_eq!(Filter::equals("class", "A").query_value(), "eq.A");
    }

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let client = TableClient::new("https://example.supabase.co/", "key");
        assert_eq!(
            client.table_url("rents"),
            "https://example.supabase.co/rest/v1/rents"
        );
    }
}
