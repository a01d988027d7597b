//! HTTP calls made by the store: JSON-AD `GET` and commit `POST`.
//!
//! No retries and no backoff. A failure is returned once and the caller
//! decides what to do with it.

use atomicdata::urls::JSON_AD_MEDIA_TYPE;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};

use crate::error::ClientError;

/// Thin wrapper over a pooled [`reqwest::Client`].
#[derive(Clone)]
pub(crate) struct Transport {
    client: Client,
}

impl Transport {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// `GET url` with `Accept: application/ad+json`; returns the body on 200.
    ///
    /// `subject` is only used to phrase the error message, since `url` may be
    /// a proxy address.
    pub(crate) async fn get_json_ad(&self, url: &str, subject: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, JSON_AD_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| network_error(url, e))?;
        if status != StatusCode::OK {
            return Err(ClientError::BadStatus {
                subject: subject.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// `POST url` with a serialized commit; returns the server's reply on 200.
    pub(crate) async fn post_commit(&self, url: &str, body: String) -> Result<String, ClientError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_AD_MEDIA_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        let reply = response.text().await.map_err(|e| network_error(url, e))?;
        if status != StatusCode::OK {
            return Err(ClientError::CommitRejected {
                status: status.as_u16(),
                body: reply,
            });
        }
        Ok(reply)
    }
}

fn network_error(url: &str, e: reqwest::Error) -> ClientError {
    ClientError::Network {
        url: url.to_string(),
        message: e.to_string(),
    }
}
