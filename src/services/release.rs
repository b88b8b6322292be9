use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while looking up the latest release.
///
/// Every variant is fatal; the lookup is attempted exactly once.
#[derive(Error, Debug)]
pub enum ReleaseLookupError {
    #[error("Failed to query release index {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Release index {url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Release index returned invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("No tag_name found in release data")]
    MissingTag,
}

/// Relevant part of the GitHub "latest release" response
#[derive(Debug, Deserialize)]
struct LatestRelease {
    #[serde(default)]
    tag_name: Option<serde_json::Value>,
}

/// Extract the release tag from a release index response body.
///
/// The tag is opaque: it is returned verbatim and never parsed as a version.
pub fn parse_release_tag(body: &[u8]) -> Result<String, ReleaseLookupError> {
    let release: LatestRelease = serde_json::from_slice(body)?;

    match release.tag_name {
        Some(serde_json::Value::String(tag)) if !tag.is_empty() => Ok(tag),
        _ => Err(ReleaseLookupError::MissingTag),
    }
}

/// Fetch the tag of the latest published release from `api_url`.
pub async fn fetch_latest_release_tag(
    client: &Client,
    api_url: &str,
) -> Result<String, ReleaseLookupError> {
    tracing::info!("Fetching latest release from {}", api_url);

    let request_error = |source| ReleaseLookupError::Request {
        url: api_url.to_string(),
        source,
    };

    let response = client.get(api_url).send().await.map_err(request_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ReleaseLookupError::Status {
            url: api_url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(request_error)?;
    let tag = parse_release_tag(&body)?;

    tracing::info!("Latest release tag: {}", tag);
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        let body = br#"{"tag_name": "v1.2.3", "name": "Guildium 1.2.3", "assets": []}"#;
        assert_eq!(parse_release_tag(body).unwrap(), "v1.2.3");
    }

    #[test]
    fn test_tag_is_opaque() {
        let body = br#"{"tag_name": "nightly-2024_01_01+build.7"}"#;
        assert_eq!(parse_release_tag(body).unwrap(), "nightly-2024_01_01+build.7");
    }

    #[test]
    fn test_missing_tag() {
        let body = br#"{"message": "Not Found"}"#;
        assert!(matches!(
            parse_release_tag(body),
            Err(ReleaseLookupError::MissingTag)
        ));
    }

    #[test]
    fn test_empty_or_non_string_tag() {
        assert!(matches!(
            parse_release_tag(br#"{"tag_name": ""}"#),
            Err(ReleaseLookupError::MissingTag)
        ));
        assert!(matches!(
            parse_release_tag(br#"{"tag_name": 12}"#),
            Err(ReleaseLookupError::MissingTag)
        ));
        assert!(matches!(
            parse_release_tag(br#"{"tag_name": null}"#),
            Err(ReleaseLookupError::MissingTag)
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_release_tag(b"<html>rate limited</html>"),
            Err(ReleaseLookupError::InvalidJson(_))
        ));
    }
}
