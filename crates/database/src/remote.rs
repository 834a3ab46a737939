//! Remote libSQL access over the HTTP pipeline endpoint.

use crate::error::DbError;
use crate::executor::Executor;
use crate::query::Statement;
use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use core_types::{Rows, Value};
use serde::{Deserialize, Serialize};

/// Blob payloads may arrive with or without padding.
const BLOB_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A client for a hosted libSQL database, authenticated with a bearer token.
#[derive(Clone)]
pub struct RemoteExecutor {
    client: reqwest::Client,
    pipeline_url: String,
    auth_token: String,
}

impl RemoteExecutor {
    pub fn new(url: &str, auth_token: &str) -> Result<Self, DbError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            pipeline_url: pipeline_url(url),
            auth_token: auth_token.to_string(),
        })
    }

    pub fn pipeline_url(&self) -> &str {
        &self.pipeline_url
    }
}

/// `libsql://host` is served over HTTPS; the pipeline lives under `/v2/pipeline`.
fn pipeline_url(url: &str) -> String {
    let base = match url.strip_prefix("libsql://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    };
    format!("{}/v2/pipeline", base.trim_end_matches('/'))
}

#[async_trait]
impl Executor for RemoteExecutor {
    async fn execute(&self, statement: &Statement) -> Result<Rows, DbError> {
        let body = PipelineRequest {
            requests: vec![
                StreamRequest::Execute {
                    stmt: WireStatement {
                        sql: &statement.sql,
                        args: statement.args.iter().map(encode_value).collect(),
                    },
                },
                StreamRequest::Close,
            ],
        };

        let response = self
            .client
            .post(&self.pipeline_url)
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(DbError::StatusError {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: PipelineResponse = serde_json::from_str(&text)?;
        decode_pipeline(parsed)
    }
}

// --- Wire format ---

#[derive(Debug, Serialize)]
struct PipelineRequest<'a> {
    requests: Vec<StreamRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRequest<'a> {
    Execute { stmt: WireStatement<'a> },
    Close,
}

#[derive(Debug, Serialize)]
struct WireStatement<'a> {
    sql: &'a str,
    args: Vec<WireValue>,
}

/// A cell as encoded on the wire. Integers travel as strings to keep 64-bit precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireValue {
    Null,
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    results: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: WireError },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResponse {
    Execute { result: StatementResult },
    Close,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    cols: Vec<WireColumn>,
    rows: Vec<Vec<WireValue>>,
}

#[derive(Debug, Deserialize)]
struct WireColumn {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
    code: Option<String>,
}

fn encode_value(value: &Value) -> WireValue {
    match value {
        Value::Null => WireValue::Null,
        Value::Integer(i) => WireValue::Integer { value: i.to_string() },
        Value::Real(f) => WireValue::Float { value: *f },
        Value::Text(s) => WireValue::Text { value: s.clone() },
        Value::Blob(b) => WireValue::Blob {
            base64: STANDARD_NO_PAD.encode(b),
        },
    }
}

fn decode_value(value: WireValue) -> Result<Value, DbError> {
    match value {
        WireValue::Null => Ok(Value::Null),
        WireValue::Integer { value } => value
            .parse()
            .map(Value::Integer)
            .map_err(|_| DbError::DecodeError(format!("Invalid integer cell: {}", value))),
        WireValue::Float { value } => Ok(Value::Real(value)),
        WireValue::Text { value } => Ok(Value::Text(value)),
        WireValue::Blob { base64 } => BLOB_DECODER
            .decode(base64.as_bytes())
            .map(Value::Blob)
            .map_err(|e| DbError::DecodeError(format!("Invalid blob cell: {}", e))),
    }
}

/// Extracts the result of the single `execute` step of a pipeline.
fn decode_pipeline(response: PipelineResponse) -> Result<Rows, DbError> {
    let first = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| DbError::DecodeError("Pipeline response has no results".to_string()))?;

    let result = match first {
        StreamResult::Ok {
            response: StreamResponse::Execute { result },
        } => result,
        StreamResult::Ok {
            response: StreamResponse::Close,
        } => {
            return Err(DbError::DecodeError(
                "Expected an execute result, got close".to_string(),
            ));
        }
        StreamResult::Error { error } => {
            return Err(DbError::QueryError {
                message: error.message,
                code: error.code,
            });
        }
    };

    let columns = result
        .cols
        .into_iter()
        .map(|c| c.name.unwrap_or_default())
        .collect();

    let rows = result
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(decode_value).collect::<Result<Vec<_>, _>>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Rows::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> Result<Rows, DbError> {
        decode_pipeline(serde_json::from_value(body).unwrap())
    }

    #[test]
    fn test_pipeline_url_rewrites_libsql_scheme() {
        assert_eq!(
            pipeline_url("libsql://telemetry-acme.turso.io"),
            "https://telemetry-acme.turso.io/v2/pipeline"
        );
        assert_eq!(
            pipeline_url("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080/v2/pipeline"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let stmt = Statement::with_args(
            "SELECT * FROM trade_orders WHERE symbol = ? LIMIT ?",
            vec!["BTCUSDT".into(), Value::Integer(50), Value::Null, Value::Real(1.5)],
        );
        let body = PipelineRequest {
            requests: vec![
                StreamRequest::Execute {
                    stmt: WireStatement {
                        sql: &stmt.sql,
                        args: stmt.args.iter().map(encode_value).collect(),
                    },
                },
                StreamRequest::Close,
            ],
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "requests": [
                    {
                        "type": "execute",
                        "stmt": {
                            "sql": "SELECT * FROM trade_orders WHERE symbol = ? LIMIT ?",
                            "args": [
                                { "type": "text", "value": "BTCUSDT" },
                                { "type": "integer", "value": "50" },
                                { "type": "null" },
                                { "type": "float", "value": 1.5 }
                            ]
                        }
                    },
                    { "type": "close" }
                ]
            })
        );
    }

    #[test]
    fn test_decodes_execute_result() {
        let rows = parse(json!({
            "baton": null,
            "base_url": null,
            "results": [
                {
                    "type": "ok",
                    "response": {
                        "type": "execute",
                        "result": {
                            "cols": [
                                { "name": "id", "decltype": "INTEGER" },
                                { "name": "title", "decltype": "TEXT" },
                                { "name": "score", "decltype": null },
                                { "name": "raw", "decltype": "BLOB" },
                                { "name": "note", "decltype": "TEXT" }
                            ],
                            "rows": [[
                                { "type": "integer", "value": "9007199254740993" },
                                { "type": "text", "value": "CPI beats" },
                                { "type": "float", "value": 0.75 },
                                { "type": "blob", "base64": "AQI=" },
                                { "type": "null" }
                            ]],
                            "affected_row_count": 0,
                            "last_insert_rowid": null
                        }
                    }
                },
                { "type": "ok", "response": { "type": "close" } }
            ]
        }))
        .unwrap();

        assert_eq!(rows.columns, vec!["id", "title", "score", "raw", "note"]);
        assert_eq!(
            rows.rows[0],
            vec![
                Value::Integer(9_007_199_254_740_993),
                Value::Text("CPI beats".into()),
                Value::Real(0.75),
                Value::Blob(vec![1, 2]),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_error_step_becomes_query_error() {
        let result = parse(json!({
            "results": [
                {
                    "type": "error",
                    "error": { "message": "no such column: trade_skip", "code": "SQLITE_ERROR" }
                },
                { "type": "ok", "response": { "type": "close" } }
            ]
        }));

        match result {
            Err(DbError::QueryError { message, code }) => {
                assert_eq!(message, "no such column: trade_skip");
                assert_eq!(code.as_deref(), Some("SQLITE_ERROR"));
            }
            other => panic!("expected query error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_integer_is_decode_error() {
        let result = parse(json!({
            "results": [{
                "type": "ok",
                "response": {
                    "type": "execute",
                    "result": { "cols": [{ "name": "n" }], "rows": [[{ "type": "integer", "value": "x" }]] }
                }
            }]
        }));
        assert!(matches!(result, Err(DbError::DecodeError(_))));
    }

    #[test]
    fn test_empty_results_is_decode_error() {
        assert!(matches!(parse(json!({ "results": [] })), Err(DbError::DecodeError(_))));
    }

    mod over_http {
        use super::*;
        use axum::extract::State;
        use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
        use axum::routing::post;
        use axum::{Json, Router};
        use std::sync::{Arc, Mutex};

        const TOKEN: &str = "test-token";

        type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

        async fn pipeline(
            State(captured): State<Captured>,
            headers: HeaderMap,
            Json(body): Json<serde_json::Value>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            let auth = headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let authorized = auth.as_deref() == Some("Bearer test-token");
            captured.lock().unwrap().push((auth, body));

            if !authorized {
                return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" })));
            }
            let result = json!({
                "results": [
                    {
                        "type": "ok",
                        "response": {
                            "type": "execute",
                            "result": {
                                "cols": [{ "name": "id" }, { "name": "symbol" }],
                                "rows": [[
                                    { "type": "integer", "value": "6" },
                                    { "type": "text", "value": "BTCUSDT" }
                                ]]
                            }
                        }
                    },
                    { "type": "ok", "response": { "type": "close" } }
                ]
            });
            (StatusCode::OK, Json(result))
        }

        /// Serves the pipeline endpoint on an ephemeral local port.
        async fn serve_pipeline() -> (String, Captured) {
            let captured = Captured::default();
            let app = Router::new()
                .route("/v2/pipeline", post(pipeline))
                .with_state(captured.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            (format!("http://{}", addr), captured)
        }

        /// Talks to the local stub directly, ignoring any proxy set in the environment.
        fn executor(base: &str, token: &str) -> RemoteExecutor {
            RemoteExecutor {
                client: reqwest::Client::builder().no_proxy().build().unwrap(),
                pipeline_url: pipeline_url(base),
                auth_token: token.to_string(),
            }
        }

        fn statement() -> Statement {
            Statement::with_args(
                "SELECT id, symbol FROM trade_orders WHERE symbol = ? LIMIT ?",
                vec!["BTCUSDT".into(), Value::Integer(1)],
            )
        }

        #[tokio::test]
        async fn test_execute_posts_pipeline_with_bearer_token() {
            let (base, captured) = serve_pipeline().await;
            let remote = executor(&base, TOKEN);

            let rows = remote.execute(&statement()).await.unwrap();

            assert_eq!(rows.columns, vec!["id", "symbol"]);
            assert_eq!(
                rows.rows,
                vec![vec![Value::Integer(6), Value::Text("BTCUSDT".into())]]
            );

            let captured = captured.lock().unwrap();
            assert_eq!(captured.len(), 1);
            let (auth, body) = &captured[0];
            assert_eq!(auth.as_deref(), Some("Bearer test-token"));
            assert_eq!(
                body,
                &json!({
                    "requests": [
                        {
                            "type": "execute",
                            "stmt": {
                                "sql": "SELECT id, symbol FROM trade_orders WHERE symbol = ? LIMIT ?",
                                "args": [
                                    { "type": "text", "value": "BTCUSDT" },
                                    { "type": "integer", "value": "1" }
                                ]
                            }
                        },
                        { "type": "close" }
                    ]
                })
            );
        }

        #[tokio::test]
        async fn test_rejected_token_is_status_error() {
            let (base, captured) = serve_pipeline().await;
            let remote = executor(&base, "expired-token");

            match remote.execute(&statement()).await {
                Err(DbError::StatusError { status, body }) => {
                    assert_eq!(status, 401);
                    assert!(body.contains("Unauthorized"));
                }
                other => panic!("expected status error, got {:?}", other),
            }
            assert_eq!(
                captured.lock().unwrap()[0].0.as_deref(),
                Some("Bearer expired-token")
            );
        }
    }
}
