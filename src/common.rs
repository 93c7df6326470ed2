// Default URLs
pub static DEFAULT_AUTH_URL: &str = "https://auth-api.mypos.com";
pub static DEFAULT_API_URL: &str = "https://transactions-api.mypos.com";
pub static DEFAULT_WEBHOOKS_URL: &str = "https://webhook-api.mypos.com";

// Header names
pub static REQUEST_ID_HEADER: &str = "X-Request-ID";
pub static API_KEY_HEADER: &str = "API-Key";
pub static SIGNATURE_HEADER: &str = "X-myPOS-Signature";

/// Appends `path` to `base`, keeping any path prefix already present in `base`.
pub(crate) fn endpoint_url(base: &reqwest::Url, path: &str) -> Result<reqwest::Url, crate::Error> {
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    reqwest::Url::parse(&joined).map_err(|e| crate::Error::Other(e.into()))
}
