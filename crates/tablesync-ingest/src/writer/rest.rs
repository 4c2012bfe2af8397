//! PostgREST-compatible writer (Supabase REST API)

use super::{Outcome, TableWriter};
use crate::config::RemoteConfig;
use crate::record::{Batch, NormalizedRecord};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use tablesync_common::{Result, SyncError};
use tracing::debug;

/// Path segments of the REST endpoint under the project URL
const REST_PATH: [&str; 2] = ["rest", "v1"];

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct RestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Insert,
    Update,
}

/// Writes to `{url}/rest/v1/{table}`
#[derive(Debug, Clone)]
pub struct RestTableWriter {
    client: Client,
    base_url: Url,
}

impl RestTableWriter {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        config.validate()?;

        let invalid_url = || SyncError::config(format!("invalid remote url '{}'", config.url));
        let mut base_url = Url::parse(config.url.trim()).map_err(|_| invalid_url())?;
        base_url
            .path_segments_mut()
            .map_err(|_| invalid_url())?
            .pop_if_empty()
            .extend(REST_PATH);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&config.service_key)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", config.service_key))?,
        );
        headers.insert("prefer", HeaderValue::from_static("return=representation"));
        if let Some(schema) = &config.schema {
            headers.insert("content-profile", header_value(schema)?);
            headers.insert("accept-profile", header_value(schema)?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// `{base}/rest/v1/{table}` with the table name as one escaped segment
    fn table_url(&self, table: &str) -> Url {
        let mut url = self.base_url.clone();
        // base_url was checked to take path segments in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(table);
        }
        url
    }

    async fn execute(&self, request: RequestBuilder, op: Operation) -> Outcome {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Outcome::transport(e.to_string()),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Outcome::transport(format!("failed to read response: {}", e)),
        };
        debug!(%status, bytes = body.len(), "Remote response");

        if !status.is_success() {
            return match serde_json::from_str::<RestError>(&body) {
                Ok(err) => {
                    let details = match (err.details, err.hint) {
                        (Some(details), Some(hint)) => Some(format!("{} (hint: {})", details, hint)),
                        (details, None) => details,
                        (None, Some(hint)) => Some(format!("hint: {}", hint)),
                    };
                    Outcome::rejected(
                        err.code.or_else(|| Some(status.as_u16().to_string())),
                        err.message.unwrap_or_else(|| status.to_string()),
                        details,
                    )
                },
                Err(_) => Outcome::rejected(
                    Some(status.as_u16().to_string()),
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string(),
                    (!body.trim().is_empty()).then(|| body.trim().to_string()),
                ),
            };
        }

        // 204 No Content and friends completed without returning rows
        let rows = if body.trim().is_empty() {
            0
        } else {
            match serde_json::from_str::<Vec<serde_json::Value>>(&body) {
                Ok(rows) => rows.len(),
                Err(e) => return Outcome::transport(format!("unexpected response body: {}", e)),
            }
        };

        match (rows, op) {
            (0, Operation::Update) => Outcome::NotFound,
            (0, Operation::Insert) => Outcome::rejected(None, "insert returned no rows", None),
            (rows, _) => Outcome::Success { rows },
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| SyncError::config("credentials contain characters not allowed in headers"))
}

#[async_trait]
impl TableWriter for RestTableWriter {
    async fn insert_batch(&self, table: &str, batch: &Batch) -> Outcome {
        let request = self.client.post(self.table_url(table)).json(batch);
        self.execute(request, Operation::Insert).await
    }

    async fn update_by_key(
        &self,
        table: &str,
        key_field: &str,
        key_value: &str,
        payload: &NormalizedRecord,
    ) -> Outcome {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[(key_field, format!("eq.{}", key_value))])
            .json(payload);
        self.execute(request, Operation::Update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tablesync_common::FieldValue;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str) -> RemoteConfig {
        RemoteConfig {
            url: url.to_string(),
            service_key: "service-key".to_string(),
            schema: None,
            timeout_secs: 5,
        }
    }

    fn record(row: u64, fields: &[(&str, Option<&str>)]) -> NormalizedRecord {
        NormalizedRecord::new(
            row,
            fields
                .iter()
                .map(|(name, value)| {
                    let value = match value {
                        Some(v) => FieldValue::Text(v.to_string()),
                        None => FieldValue::Null,
                    };
                    (name.to_string(), value)
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_insert_posts_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/questions"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!([
                {"id": "1", "title": "Algebra"},
                {"id": "2", "title": null}
            ])))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([{"id": "1"}, {"id": "2"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let writer = RestTableWriter::new(&config(&server.uri())).unwrap();
        let batch = Batch::new(vec![
            record(1, &[("id", Some("1")), ("title", Some("Algebra"))]),
            record(2, &[("id", Some("2")), ("title", None)]),
        ])
        .unwrap();

        let outcome = writer.insert_batch("questions", &batch).await;
        assert_eq!(outcome, Outcome::Success { rows: 2 });
    }

    #[tokio::test]
    async fn test_insert_rejected_with_postgrest_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/questions"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"questions_pkey\"",
                "details": "Key (id)=(1) already exists.",
                "hint": null
            })))
            .mount(&server)
            .await;

        let writer = RestTableWriter::new(&config(&server.uri())).unwrap();
        let batch = Batch::new(vec![record(1, &[("id", Some("1"))])]).unwrap();

        match writer.insert_batch("questions", &batch).await {
            Outcome::RemoteRejected { code, details, .. } => {
                assert_eq!(code.as_deref(), Some("23505"));
                assert_eq!(details.as_deref(), Some("Key (id)=(1) already exists."));
            },
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_insert_with_empty_response_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .mount(&server)
            .await;

        let writer = RestTableWriter::new(&config(&server.uri())).unwrap();
        let batch = Batch::new(vec![record(1, &[("id", Some("1"))])]).unwrap();
        assert!(writer.insert_batch("questions", &batch).await.is_failure());
    }

    #[tokio::test]
    async fn test_table_name_is_one_escaped_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/weird%3Fx%2Fy"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": "1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let writer = RestTableWriter::new(&config(&server.uri())).unwrap();
        let batch = Batch::new(vec![record(1, &[("id", Some("1"))])]).unwrap();
        let outcome = writer.insert_batch("weird?x/y", &batch).await;
        assert_eq!(outcome, Outcome::Success { rows: 1 });

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.query(), None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let writer = RestTableWriter::new(&config("https://example.supabase.co/")).unwrap();
        assert_eq!(
            writer.table_url("questions").as_str(),
            "https://example.supabase.co/rest/v1/questions"
        );
    }

    #[tokio::test]
    async fn test_update_filters_by_key() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/exams"))
            .and(query_param("exam_id", "eq.e-1"))
            .and(body_json(json!({"title": "Final"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"exam_id": "e-1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let writer = RestTableWriter::new(&config(&server.uri())).unwrap();
        let payload = record(1, &[("title", Some("Final"))]);
        let outcome = writer.update_by_key("exams", "exam_id", "e-1", &payload).await;
        assert_eq!(outcome, Outcome::Success { rows: 1 });
    }

    #[tokio::test]
    async fn test_update_matching_nothing_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let writer = RestTableWriter::new(&config(&server.uri())).unwrap();
        let payload = record(1, &[("title", Some("Final"))]);
        let outcome = writer.update_by_key("exams", "id", "404", &payload).await;
        assert_eq!(outcome, Outcome::NotFound);
    }

    #[tokio::test]
    async fn test_no_content_reply() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let writer = RestTableWriter::new(&config(&server.uri())).unwrap();
        let payload = record(1, &[("title", Some("Final"))]);
        let outcome = writer.update_by_key("exams", "id", "1", &payload).await;
        assert_eq!(outcome, Outcome::NotFound);

        let batch = Batch::new(vec![record(1, &[("id", Some("1"))])]).unwrap();
        match writer.insert_batch("questions", &batch).await {
            Outcome::RemoteRejected { message, .. } => {
                assert_eq!(message, "insert returned no rows")
            },
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_uses_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let writer = RestTableWriter::new(&config(&server.uri())).unwrap();
        let payload = record(1, &[("title", Some("Final"))]);
        match writer.update_by_key("exams", "id", "1", &payload).await {
            Outcome::RemoteRejected { code, details, .. } => {
                assert_eq!(code.as_deref(), Some("502"));
                assert_eq!(details.as_deref(), Some("bad gateway"));
            },
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_failure() {
        let writer = RestTableWriter::new(&config("http://127.0.0.1:9")).unwrap();
        let batch = Batch::new(vec![record(1, &[("id", Some("1"))])]).unwrap();
        assert!(matches!(
            writer.insert_batch("questions", &batch).await,
            Outcome::TransportFailure { .. }
        ));
    }

    #[test]
    fn test_rejects_missing_credentials() {
        let mut cfg = config("https://example.supabase.co");
        cfg.service_key = String::new();
        assert!(RestTableWriter::new(&cfg).is_err());
    }
}
