use crate::cli::{actions::connect, globals::GlobalArgs};
use crate::client::ApiRequest;
use anyhow::{anyhow, Context, Result};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub method: Method,
    pub path: String,
    pub data: Option<Value>,
}

/// Parse an HTTP method, accepting any casing.
///
/// # Errors
/// Returns an error for methods the escrow API does not serve.
pub fn parse_method(method: &str) -> Result<Method> {
    match method.trim().to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        other => Err(anyhow!("unsupported method: {other}")),
    }
}

/// # Errors
/// Returns an error if the request body is not valid JSON.
pub fn parse_data(data: Option<&String>) -> Result<Option<Value>> {
    data.map(|raw| serde_json::from_str(raw).context("--data must be valid JSON"))
        .transpose()
}

/// # Errors
/// Returns an error if login or the request fails.
pub async fn execute(args: Args) -> Result<()> {
    let connection = connect(&args.globals).await?;

    let mut request = ApiRequest::new(args.method, &args.path);
    if let Some(data) = &args.data {
        request = request.json(data)?;
    }
    debug!(
        idempotency_key = request.idempotency_key().unwrap_or("none"),
        "sending request"
    );

    let result = connection.client.send(request).await;
    connection.report_navigation();
    let response = result?;

    super::print_body(response.bytes());
    Ok(())
}
