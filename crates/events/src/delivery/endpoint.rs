//! Webhook target: URL plus optional bearer credential.

use std::fmt;

use applyhook_core::CoreError;
use reqwest::header::HeaderValue;
use reqwest::Url;

/// Bearer credential attached as `Authorization: Bearer <token>`.
///
/// The header value is built once at construction and marked sensitive.
/// `Debug` never prints the token.
#[derive(Clone)]
pub struct Credential {
    header: HeaderValue,
}

impl Credential {
    /// Returns `Ok(None)` for an empty token, so "no auth" is never
    /// represented as an empty header.
    pub fn new(token: &str) -> Result<Option<Self>, CoreError> {
        if token.is_empty() {
            return Ok(None);
        }

        let mut header = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            CoreError::InvalidEndpoint(
                "credential contains characters not allowed in a header".into(),
            )
        })?;
        header.set_sensitive(true);

        Ok(Some(Self { header }))
    }

    pub fn authorization_header(&self) -> &HeaderValue {
        &self.header
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Where a webhook is delivered.
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: Url,
    credential: Option<Credential>,
}

impl Endpoint {
    /// Parse and validate an endpoint. Only absolute `http` / `https` URLs
    /// are accepted.
    pub fn new(url: &str, token: Option<&str>) -> Result<Self, CoreError> {
        let url = Url::parse(url.trim())
            .map_err(|e| CoreError::InvalidEndpoint(format!("{url:?}: {e}")))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CoreError::InvalidEndpoint(format!(
                    "unsupported scheme {other:?}"
                )))
            }
        }

        let credential = match token {
            Some(token) => Credential::new(token)?,
            None => None,
        };

        Ok(Self { url, credential })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}
