pub mod extension;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use futures_util::StreamExt;
use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::model::DownloadedFile;
use extension::{content_type_extension, resolve_url_extension};

/// Downloads media files into a working directory, at most once per destination
pub struct MediaDownloader {
    client: Client,
}

impl MediaDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download `source_url` to `<dir>/<base_name>.<ext>`.
    ///
    /// Returns early with `skipped = true` when the file, or its alternate
    /// name derived from the response `Content-Type`, already exists. The
    /// body is written to a `.part` sibling and renamed once complete, so an
    /// interrupted transfer never looks like a finished file.
    pub async fn download(
        &self,
        dir: &Path,
        base_name: &str,
        source_url: &str,
        mtime: SystemTime,
    ) -> Result<DownloadedFile, DownloadError> {
        let resolved = resolve_url_extension(source_url);
        let nominal = dir.join(format!("{}.{}", base_name, resolved.extension));
        debug!(
            "Resolved extension '{}' for {} ({:?})",
            resolved.extension, source_url, resolved.source
        );

        if exists(&nominal).await {
            info!("{} exists", nominal.display());
            return Ok(DownloadedFile {
                path: nominal,
                skipped: true,
            });
        }

        let response = self.client.get(source_url).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::Status(response.status()));
        }

        let alternate = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(content_type_extension)
            .map(|ext| dir.join(format!("{}.{}", base_name, ext)));

        if let Some(alternate) = alternate.filter(|alternate| *alternate != nominal) {
            if exists(&alternate).await {
                info!("{} exists", alternate.display());
                return Ok(DownloadedFile {
                    path: alternate,
                    skipped: true,
                });
            }
        }

        let partial = partial_path(&nominal);
        let io_error = |source: std::io::Error| DownloadError::Io {
            path: nominal.clone(),
            source,
        };

        let mut file = fs::File::create(&partial).await.map_err(io_error)?;
        let mut body = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;

        let file = file.into_std().await;
        file.set_modified(mtime).map_err(io_error)?;
        drop(file);

        fs::rename(&partial, &nominal).await.map_err(io_error)?;
        info!("Downloaded {} ({} bytes)", nominal.display(), written);

        Ok(DownloadedFile {
            path: nominal,
            skipped: false,
        })
    }
}

async fn exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
