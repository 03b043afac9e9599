// src/lambda/mod.rs

//! AWS Lambda adapter for `/api/gen`.
//!
//! Accepts function-URL and API Gateway proxy events (payload v1 and v2),
//! hands the query string to the [`Dispatcher`] and answers with a proxy
//! response carrying the JSON body.

use std::collections::HashMap;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::dispatch::{Dispatcher, options_headers};

/// The parts of a proxy event the endpoint looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub method: String,
    pub params: HashMap<String, String>,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
}

impl ProxyRequest {
    /// Read method, query string and headers from either payload version.
    pub fn from_event(event: &Value) -> Self {
        let method = event
            .pointer("/requestContext/http/method")
            .or_else(|| event.get("httpMethod"))
            .and_then(Value::as_str)
            .unwrap_or("GET")
            .to_ascii_uppercase();

        Self {
            method,
            params: string_map(event.get("queryStringParameters"), false),
            headers: string_map(event.get("headers"), true),
        }
    }

    fn is_preflight(&self) -> bool {
        [
            "origin",
            "access-control-request-method",
            "access-control-request-headers",
        ]
        .iter()
        .all(|name| self.headers.contains_key(*name))
    }
}

fn string_map(value: Option<&Value>, lowercase_keys: bool) -> HashMap<String, String> {
    let Some(object) = value.and_then(Value::as_object) else {
        return HashMap::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| {
            let key = if lowercase_keys {
                key.to_ascii_lowercase()
            } else {
                key.clone()
            };
            value.as_str().map(|v| (key, v.to_string()))
        })
        .collect()
}

fn proxy_response(status: u16, headers: Value, body: String) -> Value {
    json!({
        "statusCode": status,
        "headers": headers,
        "body": body,
        "isBase64Encoded": false,
    })
}

/// Answer one proxy event.
#[instrument(skip(dispatcher, event), fields(request_id = %event.context.request_id))]
pub async fn handler(
    dispatcher: &Dispatcher,
    event: LambdaEvent<Value>,
) -> std::result::Result<Value, LambdaError> {
    let request = ProxyRequest::from_event(&event.payload);
    info!("{} /api/gen {:?}", request.method, request.params);

    if request.method == "OPTIONS" {
        let headers: serde_json::Map<String, Value> = options_headers(request.is_preflight())
            .into_iter()
            .map(|(name, value)| (name.to_string(), Value::from(value)))
            .collect();
        return Ok(proxy_response(200, Value::Object(headers), String::new()));
    }

    let answer = dispatcher.handle(&request.params).await;
    let body = serde_json::to_string(&answer.body)?;
    Ok(proxy_response(
        answer.status,
        json!({
            "Content-Type": "application/json; charset=utf-8",
            "Access-Control-Allow-Origin": "*",
        }),
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_function_url_event() {
        let event = json!({
            "version": "2.0",
            "rawQueryString": "site=douban&sid=1292052",
            "queryStringParameters": { "site": "douban", "sid": "1292052" },
            "headers": { "Origin": "https://example.org" },
            "requestContext": { "http": { "method": "get", "path": "/api/gen" } }
        });

        let request = ProxyRequest::from_event(&event);
        assert_eq!(request.method, "GET");
        assert_eq!(request.params["sid"], "1292052");
        assert_eq!(request.headers["origin"], "https://example.org");
        assert!(!request.is_preflight());
    }

    #[test]
    fn reads_rest_api_event_without_query() {
        let event = json!({
            "httpMethod": "OPTIONS",
            "queryStringParameters": null,
            "headers": {
                "Origin": "https://example.org",
                "Access-Control-Request-Method": "GET",
                "Access-Control-Request-Headers": "content-type"
            }
        });

        let request = ProxyRequest::from_event(&event);
        assert_eq!(request.method, "OPTIONS");
        assert!(request.params.is_empty());
        assert!(request.is_preflight());
    }

    #[test]
    fn missing_method_defaults_to_get() {
        let request = ProxyRequest::from_event(&json!({}));
        assert_eq!(request.method, "GET");
    }
}
