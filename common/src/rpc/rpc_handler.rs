use std::{collections::HashMap, future::Future, pin::Pin};

use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{InternalRpcError, RpcRequest, RpcResponse, RpcResponseError, JSON_RPC_VERSION};
use crate::context::Context;

pub type Handler = fn(
    &'_ Context,
    Value,
) -> Pin<Box<dyn Future<Output = Result<Value, InternalRpcError>> + Send + '_>>;

// Maximum requests accepted in a single batch
pub const DEFAULT_BATCH_LIMIT: usize = 20;

pub struct RPCHandler<T: Send + Clone + 'static> {
    methods: HashMap<String, Handler>,
    data: T,
    batch_limit: usize,
}

impl<T> RPCHandler<T>
where
    T: Send + Sync + Clone + 'static,
{
    pub fn new(data: T) -> Self {
        Self {
            methods: HashMap::new(),
            data,
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }

    // Handle a raw body with a context only holding the handler data
    pub async fn handle_request(&self, body: &[u8]) -> Result<Value, RpcResponseError> {
        let mut context = Context::new();
        context.store(self.data.clone());
        self.handle_request_with_context(context, body).await
    }

    pub async fn handle_request_with_context(
        &self,
        context: Context,
        body: &[u8],
    ) -> Result<Value, RpcResponseError> {
        let request: Value = serde_json::from_slice(body)
            .map_err(|_| RpcResponseError::new(None, InternalRpcError::ParseBodyError))?;

        match request {
            Value::Array(requests) => {
                if requests.len() > self.batch_limit {
                    return Err(RpcResponseError::new(
                        None,
                        InternalRpcError::BatchLimitExceeded,
                    ));
                }

                let mut responses = Vec::with_capacity(requests.len());
                for value in requests {
                    // Each entry fails on its own, a bad one doesn't abort the batch
                    let response = match self.execute_method(&context, value).await {
                        Ok(Some(response)) => response,
                        Ok(None) => continue,
                        Err(e) => e.to_json(),
                    };
                    responses.push(response);
                }
                Ok(Value::Array(responses))
            }
            Value::Object(_) => Ok(self
                .execute_method(&context, request)
                .await?
                .unwrap_or(Value::Null)),
            _ => Err(RpcResponseError::new(
                None,
                InternalRpcError::InvalidJSONRequest,
            )),
        }
    }

    pub fn parse_request(&self, body: Value) -> Result<RpcRequest, RpcResponseError> {
        let request: RpcRequest = serde_json::from_value(body)
            .map_err(|_| RpcResponseError::new(None, InternalRpcError::InvalidJSONRequest))?;
        if request.jsonrpc != JSON_RPC_VERSION {
            return Err(RpcResponseError::new(
                request.id,
                InternalRpcError::InvalidVersion,
            ));
        }
        Ok(request)
    }

    // Returns `None` for notifications
    pub async fn execute_method(
        &self,
        context: &Context,
        body: Value,
    ) -> Result<Option<Value>, RpcResponseError> {
        let mut request = self.parse_request(body)?;
        let handler = match self.methods.get(&request.method) {
            Some(handler) => handler,
            None => {
                return Err(RpcResponseError::new(
                    request.id,
                    InternalRpcError::MethodNotFound(request.method),
                ))
            }
        };

        trace!("executing '{}' RPC method", request.method);
        let params = request.params.take().unwrap_or(Value::Null);
        let result = handler(context, params)
            .await
            .map_err(|err| RpcResponseError::new(request.id.clone(), err))?;

        if request.id.is_none() {
            return Ok(None);
        }

        serde_json::to_value(RpcResponse::new(request.id.clone(), result))
            .map(Some)
            .map_err(|e| RpcResponseError::new(request.id, InternalRpcError::SerializeResponse(e)))
    }

    pub fn register_method(&mut self, name: &str, handler: Handler) {
        debug!("Registering RPC method: {}", name);
        self.methods.insert(name.into(), handler);
    }

    pub fn get_data(&self) -> &T {
        &self.data
    }
}

pub fn parse_params<P: DeserializeOwned>(value: Value) -> Result<P, InternalRpcError> {
    if value.is_null() {
        return Err(InternalRpcError::ExpectedParams);
    }

    serde_json::from_value(value).map_err(InternalRpcError::InvalidJSONParams)
}

// RPC Method with no params required
// Check that the params field is either null or empty
pub fn require_no_params(value: Value) -> Result<(), InternalRpcError> {
    if let Some(array) = value.as_array() {
        if !array.is_empty() {
            return Err(InternalRpcError::UnexpectedParams);
        }
    } else if let Some(object) = value.as_object() {
        if !object.is_empty() {
            return Err(InternalRpcError::UnexpectedParams);
        }
    } else if !value.is_null() {
        return Err(InternalRpcError::UnexpectedParams);
    }

    Ok(())
}
