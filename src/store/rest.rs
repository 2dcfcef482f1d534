//! Record store over a hosted PostgREST endpoint.
//!
//! Requests follow the PostgREST conventions used by hosted Postgres
//! services: `/rest/v1/{table}` with `col=eq.value` filters, `order=col.asc`
//! sorting and `Prefer` headers for returned representations and counts.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use serde::Deserialize;
use serde_json::Value;

use super::{Filter, RecordStore, Row, Select, StoreError, Table};

const PREFER: &str = "Prefer";

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// HTTP client for a hosted record store.
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestStore {
    /// Build a client for `base_url` (for example `https://xyz.supabase.co`)
    /// authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key).map_err(|e| StoreError::Service {
            status: 0,
            code: None,
            message: format!("invalid API key header: {}", e),
        })?;
        let bearer =
            HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                StoreError::Service {
                    status: 0,
                    code: None,
                    message: format!("invalid API key header: {}", e),
                }
            })?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }
}

/// Render a filter value the way PostgREST expects it in `eq.` operands.
fn filter_operand(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn filter_param(filter: &Filter) -> (String, String) {
    (
        filter.column.to_string(),
        format!("eq.{}", filter_operand(&filter.value)),
    )
}

/// Turn a non-success response into a [`StoreError::Service`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ServiceErrorBody>(&body) {
        Ok(parsed) => {
            let message = match (parsed.message, parsed.details) {
                (Some(m), Some(d)) => format!("{} ({})", m, d),
                (Some(m), None) => m,
                (None, _) => body.clone(),
            };
            (parsed.code, message)
        }
        Err(_) => (None, body),
    };

    Err(StoreError::Service {
        status: status.as_u16(),
        code,
        message,
    })
}

fn first_row(table: Table, rows: Vec<Value>) -> Option<Result<Row, StoreError>> {
    rows.into_iter().next().map(|value| match value {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Decode {
            table,
            message: format!("expected an object, got {}", other),
        }),
    })
}

fn into_rows(table: Table, rows: Vec<Value>) -> Result<Vec<Row>, StoreError> {
    rows.into_iter()
        .map(|value| match value {
            Value::Object(row) => Ok(row),
            other => Err(StoreError::Decode {
                table,
                message: format!("expected an object, got {}", other),
            }),
        })
        .collect()
}

/// Parse the total out of a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl RecordStore for RestStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(filter) = &query.filter {
            params.push(filter_param(filter));
        }
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        let response = self
            .client
            .get(self.table_url(query.table))
            .query(&params)
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;

        tracing::debug!(table = %query.table, rows = rows.len(), "select");
        into_rows(query.table, rows)
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header(PREFER, "return=representation")
            .json(&[Value::Object(row)])
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;

        first_row(table, rows).unwrap_or_else(|| {
            Err(StoreError::Decode {
                table,
                message: "insert returned no representation".to_string(),
            })
        })
    }

    async fn update(&self, table: Table, id: &str, changes: Row) -> Result<Row, StoreError> {
        let response = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{}", id))])
            .header(PREFER, "return=representation")
            .json(&Value::Object(changes))
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;

        first_row(table, rows).unwrap_or_else(|| {
            Err(StoreError::NotFound {
                table,
                id: id.to_string(),
            })
        })
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.table_url(table))
            .query(&[filter_param(filter)])
            .send()
            .await?;
        check(response).await?;

        tracing::debug!(table = %table, column = filter.column, "delete");
        Ok(())
    }

    async fn count(&self, table: Table) -> Result<u64, StoreError> {
        let response = self
            .client
            .head(self.table_url(table))
            .query(&[("select", "*")])
            .header(PREFER, "count=exact")
            .send()
            .await?;
        let response = check(response).await?;

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0);
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Order;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap as AxumHeaders, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    /// Minimal PostgREST stand-in that echoes what it was asked.
    async fn spawn_mock() -> String {
        async fn list(
            Path(table): Path<String>,
            Query(params): Query<HashMap<String, String>>,
            headers: AxumHeaders,
        ) -> impl IntoResponse {
            if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("anon-key") {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Invalid API key" })),
                )
                    .into_response();
            }
            Json(json!([{
                "id": 1,
                "table": table,
                "section_id": params.get("section_id"),
                "order": params.get("order"),
            }]))
            .into_response()
        }

        async fn head_count() -> impl IntoResponse {
            ([("content-range", "*/42")], StatusCode::OK)
        }

        async fn insert(Json(body): Json<Vec<Value>>) -> impl IntoResponse {
            let mut row = body.into_iter().next().unwrap_or_else(|| json!({}));
            row["id"] = json!("generated");
            (StatusCode::CREATED, Json(json!([row])))
        }

        async fn patch(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
            if params.get("id").map(String::as_str) == Some("eq.missing") {
                return Json(json!([]));
            }
            Json(json!([{ "id": "r1", "title": "patched" }]))
        }

        async fn remove() -> impl IntoResponse {
            (
                StatusCode::CONFLICT,
                Json(json!({ "code": "23503", "message": "violates foreign key", "details": "rules" })),
            )
        }

        let app = Router::new().route(
            "/rest/v1/{table}",
            get(list)
                .head(head_count)
                .post(insert)
                .patch(patch)
                .delete(remove),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_select_sends_filter_and_order() {
        let base = spawn_mock().await;
        let store = RestStore::new(&base, "anon-key").unwrap();

        let rows = store
            .select(
                &Select::all(Table::Rules)
                    .filter(Filter::eq("section_id", "s1"))
                    .order(Order::asc("order_index")),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["table"], "rules");
        assert_eq!(rows[0]["section_id"], "eq.s1");
        assert_eq!(rows[0]["order"], "order_index.asc");
    }

    #[tokio::test]
    async fn test_service_error_carries_detail() {
        let base = spawn_mock().await;
        let store = RestStore::new(&base, "wrong-key").unwrap();

        let err = store.select(&Select::all(Table::Rules)).await.unwrap_err();
        match err {
            StoreError::Service {
                status, message, ..
            } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_count_reads_content_range() {
        let base = spawn_mock().await;
        let store = RestStore::new(&base, "anon-key").unwrap();

        assert_eq!(store.count(Table::RuleSections).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_insert_returns_representation() {
        let base = spawn_mock().await;
        let store = RestStore::new(&base, "anon-key").unwrap();

        let mut row = Row::new();
        row.insert("title".into(), json!("Generale"));
        let stored = store.insert(Table::RuleSections, row).await.unwrap();

        assert_eq!(stored["id"], "generated");
        assert_eq!(stored["title"], "Generale");
    }

    #[tokio::test]
    async fn test_update_without_rows_is_not_found() {
        let base = spawn_mock().await;
        let store = RestStore::new(&base, "anon-key").unwrap();

        let err = store
            .update(Table::Rules, "missing", Row::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let row = store.update(Table::Rules, "r1", Row::new()).await.unwrap();
        assert_eq!(row["title"], "patched");
    }

    #[tokio::test]
    async fn test_delete_error_code_is_kept() {
        let base = spawn_mock().await;
        let store = RestStore::new(&base, "anon-key").unwrap();

        let err = store
            .delete(Table::RuleSections, &Filter::eq("id", "s1"))
            .await
            .unwrap_err();
        match err {
            StoreError::Service {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("23503"));
                assert_eq!(message, "violates foreign key (rules)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("*/*"), None);
    }
}
