use log::*;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::ProcessorApiError;

pub(crate) fn build_client(
    builder: reqwest::ClientBuilder,
    timeout: std::time::Duration,
) -> Result<Client, ProcessorApiError> {
    builder.timeout(timeout).build().map_err(|e| ProcessorApiError::Initialization(e.to_string()))
}

/// Sends the request and deserializes a successful JSON response. Unsuccessful responses are passed to
/// `error_message` to extract a readable message from the body.
pub(crate) async fn send_request<T: DeserializeOwned>(
    req: RequestBuilder,
    error_message: fn(&str) -> String,
) -> Result<T, ProcessorApiError> {
    let response = req.send().await.map_err(|e| ProcessorApiError::RestResponseError(e.to_string()))?;
    parse_response(response, error_message).await
}

async fn parse_response<T: DeserializeOwned>(
    response: Response,
    error_message: fn(&str) -> String,
) -> Result<T, ProcessorApiError> {
    let status = response.status();
    if status.is_success() {
        trace!("REST query successful. {status}");
        response.json::<T>().await.map_err(|e| ProcessorApiError::JsonError(e.to_string()))
    } else {
        let body = response.text().await.map_err(|e| ProcessorApiError::RestResponseError(e.to_string()))?;
        let message = error_message(&body);
        debug!("REST query failed. {status}. {message}");
        Err(ProcessorApiError::QueryError { status: status.as_u16(), message })
    }
}
