use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use log::trace;
use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::JSON_RPC_VERSION;

const PARSE_ERROR_CODE: i16 = -32700;
const INVALID_REQUEST_CODE: i16 = -32600;
const METHOD_NOT_FOUND_CODE: i16 = -32601;
const INVALID_PARAMS_CODE: i16 = -32602;
const INTERNAL_ERROR_CODE: i16 = -32603;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum JsonRPCError {
    #[error("Server failed to parse request: {}", message)]
    ParseError { message: String },
    #[error("Server did not receive a valid JSON-RPC request: {}", message)]
    InvalidRequest { message: String },
    #[error("Requested method not found: {}", message)]
    MethodNotFound { message: String },
    #[error("Invalid method parameter(s): {}", message)]
    InvalidParams { message: String },
    #[error("Server internal JSON-RPC error: {}", message)]
    InternalError { message: String },
    #[error("Server error: {} (code: {})", message, code)]
    ServerError { code: i16, message: String },
    #[error("Server returned a response without result")]
    NoResponse,
    #[error("Error while (de)serializing JSON data: {}", _0)]
    SerializationError(#[from] serde_json::Error),
    #[error("HTTP error during JSON-RPC communication: {}", _0)]
    HttpError(#[from] reqwest::Error),
    #[error("Server returned invalid JSON-RPC response: {}", _0)]
    InvalidResponse(String),
}

impl JsonRPCError {
    fn from_error_object(error: &Value) -> Self {
        let code = error["code"].as_i64().unwrap_or(INTERNAL_ERROR_CODE as i64) as i16;
        let message = error["message"].as_str().unwrap_or_default().to_owned();
        match code {
            PARSE_ERROR_CODE => Self::ParseError { message },
            INVALID_REQUEST_CODE => Self::InvalidRequest { message },
            METHOD_NOT_FOUND_CODE => Self::MethodNotFound { message },
            INVALID_PARAMS_CODE => Self::InvalidParams { message },
            INTERNAL_ERROR_CODE => Self::InternalError { message },
            code => Self::ServerError { code, message },
        }
    }
}

pub type JsonRPCResult<T> = Result<T, JsonRPCError>;

// HTTP JSON-RPC client, one request in flight per call
pub struct JsonRPCClient {
    http: HttpClient,
    target: String,
    count: AtomicU64,
}

impl JsonRPCClient {
    pub fn new(target: String) -> JsonRPCResult<Self> {
        Self::with_timeout(target, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(target: String, timeout: Duration) -> JsonRPCResult<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            target,
            count: AtomicU64::new(0),
        })
    }

    pub async fn call<R: DeserializeOwned>(&self, method: &str) -> JsonRPCResult<R> {
        self.send(json!({
            "jsonrpc": JSON_RPC_VERSION,
            "method": method,
            "id": self.next_id()
        }))
        .await
    }

    pub async fn call_with<P, R>(&self, method: &str, params: &P) -> JsonRPCResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(json!({
            "jsonrpc": JSON_RPC_VERSION,
            "method": method,
            "id": self.next_id(),
            "params": serde_json::to_value(params)?
        }))
        .await
    }

    fn next_id(&self) -> u64 {
        self.count.fetch_add(1, Ordering::SeqCst)
    }

    async fn send<R: DeserializeOwned>(&self, body: Value) -> JsonRPCResult<R> {
        trace!("JSON-RPC request to {}: {}", self.target, body);
        let response: Value = self
            .http
            .post(&self.target)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            return Err(JsonRPCError::from_error_object(error));
        }

        let object = response
            .as_object()
            .ok_or_else(|| JsonRPCError::InvalidResponse(response.to_string()))?;
        let result = object.get("result").ok_or(JsonRPCError::NoResponse)?;
        Ok(serde_json::from_value(result.clone())?)
    }
}
