use crate::models::{NetworkSettings, ReleaseSettings};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;

/// Client for the release index API.
///
/// Redirects are followed by reqwest (bounded by `max_redirects`) so renamed
/// repositories keep resolving.
pub fn build_api_client(
    release: &ReleaseSettings,
    network: &NetworkSettings,
) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );

    Client::builder()
        .user_agent(release.user_agent.as_str())
        .default_headers(default_headers)
        .timeout(network.request_timeout())
        .redirect(Policy::limited(network.max_redirects))
        .build()
}

/// Client for artifact downloads.
///
/// Automatic redirects are disabled; [`crate::services::download`] follows
/// them itself so it can bound and log every hop.
pub fn build_download_client(
    release: &ReleaseSettings,
    network: &NetworkSettings,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(release.user_agent.as_str())
        .timeout(network.request_timeout())
        .redirect(Policy::none())
        .build()
}
