
#[cfg(not(feature = "acceptance-tests"))]
/// How the mock server reports a request authenticated with an expired access token.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StaleSignal {
    /// `401 Unauthorized`
    Unauthorized,
    /// `200 OK` with a `{"code": 503}` body
    Code503,
}
