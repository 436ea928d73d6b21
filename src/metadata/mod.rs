mod graphql;

use log::{debug, info};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::MetadataConfig;
use crate::error::MetadataError;
use crate::model::{AssetDescriptor, PostIdentifier};
use graphql::{GraphResponse, PostShape};

/// Looks up the media of a post through the GraphQL query endpoint
pub struct MetadataFetcher {
    client: Client,
    endpoint: String,
    query_hash: String,
    timeout: Option<Duration>,
}

impl MetadataFetcher {
    pub fn new(client: Client, config: &MetadataConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            query_hash: config.query_hash.clone(),
            timeout: None,
        }
    }

    /// Limit each metadata request, body included, to `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Query URL for a post: the short code is passed as URL-encoded JSON variables
    pub fn query_url(&self, id: &PostIdentifier) -> String {
        let variables = json!({ "shortcode": id.as_str() }).to_string();
        format!(
            "{}?query_hash={}&variables={}",
            self.endpoint,
            self.query_hash,
            urlencoding::encode(&variables)
        )
    }

    /// Fetch the ordered asset descriptors of a post
    pub async fn fetch(&self, id: &PostIdentifier) -> Result<Vec<AssetDescriptor>, MetadataError> {
        let url = self.query_url(id);
        debug!("Fetching post metadata from {}", url);

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MetadataError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let parsed: GraphResponse = serde_json::from_slice(&body)?;
        let media = parsed
            .data
            .shortcode_media
            .ok_or(MetadataError::MissingMedia)?;

        let assets = PostShape::from(media).into_assets();
        info!("Post {} has {} asset(s)", id, assets.len());
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaKind;
    use mockito::{Matcher, Server};
    use std::io::Write as _;

    fn fetcher(server: &Server) -> MetadataFetcher {
        let config = MetadataConfig {
            endpoint: format!("{}/graphql/query/", server.url()),
            ..Default::default()
        };
        MetadataFetcher::new(Client::new(), &config)
    }

    const CAROUSEL: &str = r#"{"data": {"shortcode_media": {
        "__typename": "GraphSidecar",
        "id": "100",
        "display_url": "https://cdn.example.com/cover.jpg",
        "edge_sidecar_to_children": {"edges": [
            {"node": {"__typename": "GraphImage", "id": "101", "display_url": "https://cdn.example.com/a.jpg?sig=1"}},
            {"node": {"__typename": "GraphVideo", "id": "102", "display_url": "https://cdn.example.com/b.jpg", "video_url": "https://cdn.example.com/b.mp4?sig=2"}},
            {"node": {"__typename": "GraphImage", "id": "103", "display_url": "https://cdn.example.com/c.jpg?sig=3"}}
        ]},
        "edge_media_to_caption": {"edges": [{"node": {"text": "Lemon pasta for two"}}]}
    }}}"#;

    #[test]
    fn test_query_url_encodes_variables() {
        let config = MetadataConfig::default();
        let fetcher = MetadataFetcher::new(Client::new(), &config);
        let url = fetcher.query_url(&PostIdentifier::new("C7h7ksJOBvc"));
        assert_eq!(
            url,
            "https://www.instagram.com/graphql/query/?query_hash=2b0673e0dc4580674a88d426fe00ea90&variables=%7B%22shortcode%22%3A%22C7h7ksJOBvc%22%7D"
        );
    }

    #[tokio::test]
    async fn test_fetch_carousel_attaches_caption_to_first_only() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/graphql/query/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "query_hash".into(),
                    "2b0673e0dc4580674a88d426fe00ea90".into(),
                ),
                Matcher::UrlEncoded("variables".into(), r#"{"shortcode":"abc"}"#.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CAROUSEL)
            .create_async()
            .await;

        let assets = fetcher(&server)
            .fetch(&PostIdentifier::new("abc"))
            .await
            .unwrap();

        assert_eq!(assets.len(), 3);
        let ids: Vec<&str> = assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["101", "102", "103"]);
        assert_eq!(assets[0].caption.as_deref(), Some("Lemon pasta for two"));
        assert!(assets[1].caption.is_none());
        assert!(assets[2].caption.is_none());
        assert_eq!(assets[1].kind, MediaKind::Video);
        assert_eq!(assets[1].download_url(), "https://cdn.example.com/b.mp4?sig=2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_single_asset() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/graphql/query/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"data": {"shortcode_media": {
                    "__typename": "GraphVideo",
                    "id": "200",
                    "display_url": "https://cdn.example.com/poster.jpg",
                    "video_url": "https://cdn.example.com/clip.mp4?sig=9",
                    "edge_media_to_caption": {"edges": [{"node": {"text": "Crispy tofu"}}]}
                }}}"#,
            )
            .create_async()
            .await;

        let assets = fetcher(&server)
            .fetch(&PostIdentifier::new("xyz"))
            .await
            .unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "200");
        assert_eq!(assets[0].kind, MediaKind::Video);
        assert_eq!(assets[0].caption.as_deref(), Some("Crispy tofu"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_single_asset_without_caption() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/graphql/query/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"data": {"shortcode_media": {
                    "__typename": "GraphImage",
                    "id": "300",
                    "display_url": "https://cdn.example.com/plate.jpg"
                }}}"#,
            )
            .create_async()
            .await;

        let assets = fetcher(&server)
            .fetch(&PostIdentifier::new("xyz"))
            .await
            .unwrap();

        assert_eq!(assets.len(), 1);
        assert!(assets[0].caption.is_none());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/graphql/query/")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let result = fetcher(&server).fetch(&PostIdentifier::new("abc")).await;
        assert!(matches!(result, Err(MetadataError::Status(status)) if status.as_u16() == 429));
    }

    #[tokio::test]
    async fn test_fetch_missing_required_fields() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/graphql/query/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": {"shortcode_media": {"id": "1"}}}"#)
            .create_async()
            .await;

        let result = fetcher(&server).fetch(&PostIdentifier::new("abc")).await;
        assert!(matches!(result, Err(MetadataError::Decode(_))));
    }

    #[tokio::test]
    async fn test_fetch_unknown_post() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/graphql/query/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": {"shortcode_media": null}}"#)
            .create_async()
            .await;

        let result = fetcher(&server).fetch(&PostIdentifier::new("abc")).await;
        assert!(matches!(result, Err(MetadataError::MissingMedia)));
    }

    #[tokio::test]
    async fn test_slow_metadata_hits_request_timeout() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/graphql/query/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(std::time::Duration::from_secs(2));
                w.write_all(br#"{"data": {"shortcode_media": null}}"#)
            })
            .create_async()
            .await;

        let result = fetcher(&server)
            .with_timeout(Duration::from_millis(300))
            .fetch(&PostIdentifier::new("xyz"))
            .await;

        assert!(matches!(result, Err(MetadataError::Http(_))));
    }
}
