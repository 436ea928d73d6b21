use std::fmt;
use std::path::PathBuf;

/// Short code identifying a post, e.g. `C7h7ksJOBvc`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostIdentifier(String);

impl PostIdentifier {
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Maps the GraphQL `__typename` of a media node. Anything that is not a
    /// video is downloaded through its display URL.
    pub fn from_typename(typename: &str) -> Self {
        match typename {
            "GraphVideo" | "XDTGraphVideo" => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }
}

/// One media item of a post
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    pub id: String,
    pub kind: MediaKind,
    pub display_url: String,
    pub video_url: Option<String>,
    /// Post caption; only the first descriptor of a post carries it
    pub caption: Option<String>,
}

impl AssetDescriptor {
    /// URL of the file to download for this asset
    pub fn download_url(&self) -> &str {
        match (self.kind, self.video_url.as_deref()) {
            (MediaKind::Video, Some(url)) => url,
            _ => &self.display_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    /// True when the transfer was elided because the file already existed
    pub skipped: bool,
}

/// Natural-language description of one analyzed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSummary {
    pub source: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub summary: String,
    pub working_directory: PathBuf,
}
