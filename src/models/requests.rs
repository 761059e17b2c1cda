//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming JSON-RPC request bodies.

use serde::Deserialize;
use serde_json::Value;

/// Method name of the lookup call.
pub const GET_METHOD: &str = "CacheSrv.Get";

/// JSON-RPC 1.0 request envelope (POST /rpc)
///
/// # Fields
/// - `method`: service method, e.g. `CacheSrv.Get`
/// - `params`: single-element array holding the method arguments
/// - `id`: echoed back in the response
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    #[serde(default)]
    pub id: Value,
}

impl RpcRequest {
    /// Extracts the arguments of a `CacheSrv.Get` call.
    ///
    /// Returns an error message if the params do not hold exactly one `GetArgs`.
    pub fn get_args(&self) -> Result<GetArgs, String> {
        match self.params.as_slice() {
            [args] => serde_json::from_value(args.clone())
                .map_err(|e| format!("invalid params: {}", e)),
            other => Err(format!(
                "invalid params: expected 1 argument, got {}",
                other.len()
            )),
        }
    }
}

/// Arguments of `CacheSrv.Get`
#[derive(Debug, Clone, Deserialize)]
pub struct GetArgs {
    #[serde(rename = "Key")]
    pub key: String,
}
