use log::warn;
use serde::Deserialize;

use crate::model::{AssetDescriptor, MediaKind};

#[derive(Debug, Deserialize)]
pub(crate) struct GraphResponse {
    pub data: GraphData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphData {
    pub shortcode_media: Option<ShortcodeMedia>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShortcodeMedia {
    #[serde(flatten)]
    pub node: MediaNode,
    #[serde(default)]
    pub edge_sidecar_to_children: Option<Edges<MediaNode>>,
    #[serde(default)]
    pub edge_media_to_caption: Option<Edges<CaptionNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Edges<T> {
    #[serde(default)]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MediaNode {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub id: String,
    pub display_url: String,
    #[serde(default)]
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaptionNode {
    pub text: String,
}

/// The two observable shapes of a post
#[derive(Debug)]
pub(crate) enum PostShape {
    Carousel {
        children: Vec<MediaNode>,
        caption: Option<String>,
    },
    Single {
        asset: MediaNode,
        caption: Option<String>,
    },
}

impl From<ShortcodeMedia> for PostShape {
    fn from(media: ShortcodeMedia) -> Self {
        let caption = media
            .edge_media_to_caption
            .and_then(|captions| captions.edges.into_iter().next())
            .map(|edge| edge.node.text)
            .filter(|text| !text.is_empty());

        let children: Vec<MediaNode> = media
            .edge_sidecar_to_children
            .map(|sidecar| sidecar.edges.into_iter().map(|edge| edge.node).collect())
            .unwrap_or_default();

        if children.is_empty() {
            PostShape::Single {
                asset: media.node,
                caption,
            }
        } else {
            PostShape::Carousel { children, caption }
        }
    }
}

impl PostShape {
    /// Flatten into descriptors in post order. The caption lives on the post,
    /// so only the first descriptor carries it.
    pub fn into_assets(self) -> Vec<AssetDescriptor> {
        match self {
            PostShape::Single { asset, caption } => vec![descriptor(asset, caption)],
            PostShape::Carousel { children, caption } => {
                let mut caption = caption;
                children
                    .into_iter()
                    .map(|child| descriptor(child, caption.take()))
                    .collect()
            }
        }
    }
}

fn descriptor(node: MediaNode, caption: Option<String>) -> AssetDescriptor {
    let kind = MediaKind::from_typename(&node.typename);
    let video_url = node.video_url.filter(|url| !url.is_empty());

    if kind == MediaKind::Video && video_url.is_none() {
        warn!(
            "Video {} has no video URL, falling back to its display image",
            node.id
        );
    }

    AssetDescriptor {
        id: node.id,
        kind,
        display_url: node.display_url,
        video_url,
        caption,
    }
}
