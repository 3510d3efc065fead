use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::HOST, request::Parts},
};

use crate::storage::UPLOADS_PREFIX;

/// Scheme and host the client used to reach us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin {
    pub scheme: String,
    pub host: String,
}

impl RequestOrigin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let scheme = header("x-forwarded-proto")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .or_else(|| parts.uri.scheme_str().map(str::to_ascii_lowercase))
            .filter(|s| s == "http" || s == "https")
            .unwrap_or_else(|| "http".to_string());

        let host = header(HOST.as_str())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        Ok(Self::new(scheme, host))
    }
}

/// Turns a stored image reference into a URL the client can load.
///
/// Precedence: absent/empty -> `None`; anything starting with `http` is already
/// absolute; a path containing `uploads/` is rooted at the origin; a bare file
/// name is placed under `/uploads/`.
pub fn normalize_image(image: Option<&str>, origin: &RequestOrigin) -> Option<String> {
    let image = image.filter(|i| !i.is_empty())?;

    if image.starts_with("http") {
        return Some(image.to_string());
    }
    if image.contains(&format!("{UPLOADS_PREFIX}/")) {
        return Some(format!("{}/{}", origin.base_url(), image));
    }
    Some(format!("{}/{}/{}", origin.base_url(), UPLOADS_PREFIX, image))
}
