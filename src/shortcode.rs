use url::Url;

use crate::model::PostIdentifier;
use crate::PipelineError;

/// Extract the post short code from a URL of the form `.../p/<shortcode>/...`
pub fn extract_identifier(post_url: &str) -> Result<PostIdentifier, PipelineError> {
    let parsed =
        Url::parse(post_url).map_err(|_| PipelineError::InvalidUrlFormat(post_url.to_string()))?;

    let segments: Vec<&str> = parsed.path().split('/').collect();
    match segments.as_slice() {
        [_, "p", shortcode, ..] if !shortcode.is_empty() => Ok(PostIdentifier::new(*shortcode)),
        _ => Err(PipelineError::InvalidUrlFormat(post_url.to_string())),
    }
}

/// Reject URLs whose host is not `expected_domain` or one of its subdomains
pub fn validate_post_domain(post_url: &str, expected_domain: &str) -> Result<(), PipelineError> {
    let unsupported = || PipelineError::UnsupportedDomain {
        url: post_url.to_string(),
        expected: expected_domain.to_string(),
    };

    let parsed = Url::parse(post_url).map_err(|_| unsupported())?;
    let host = parsed.host_str().ok_or_else(unsupported)?.to_lowercase();
    let expected = expected_domain.to_lowercase();

    if host == expected || host.ends_with(&format!(".{}", expected)) {
        Ok(())
    } else {
        Err(unsupported())
    }
}
