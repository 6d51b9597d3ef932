//! Imports local audio and downloads remote audio into durable storage.

use super::media::{
    extension_for_mime, mime_for_extension, probe_file, AudioMetadata, DEFAULT_MIME,
};
use super::store::AudioStore;
use super::video::{extract_video_id, VideoResolver};
use crate::config::AcquisitionConfig;
use crate::error::{ensure_success, PipelineError, Result, ValidationError};
use crate::exercise::DraftExercise;
use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const DEFAULT_DOWNLOAD_EXTENSION: &str = "mp3";

pub struct AcquisitionManager {
    store: AudioStore,
    http: reqwest::Client,
    allowed_extensions: Vec<String>,
    resolver: Option<Arc<dyn VideoResolver>>,
}

/// Replace characters that are invalid in file names.
fn sanitize_file_name(name: &str) -> String {
    name.replace(
        |c: char| matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control(),
        "_",
    )
}

/// File name from a Content-Disposition header, preferring the RFC 5987 form.
pub fn suggested_filename(header: &str) -> Option<String> {
    let mut plain = None;
    for part in header.split(';').map(str::trim) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let value = value.trim().trim_matches('"');
                let encoded = value.rsplit("''").next().unwrap_or(value);
                let decoded = percent_decode(encoded);
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
            "filename" => {
                let value = value.trim().trim_matches('"').to_string();
                if !value.is_empty() {
                    plain = Some(value);
                }
            }
            _ => {}
        }
    }
    plain
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn file_stem(name: &str) -> Option<String> {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty())
}

struct Fetched {
    file_name: String,
    path: PathBuf,
    suggested: Option<String>,
}

impl AcquisitionManager {
    pub fn new(store: AudioStore, http: reqwest::Client, config: &AcquisitionConfig) -> Self {
        Self {
            store,
            http,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            resolver: None,
        }
    }

    pub fn with_video_resolver(mut self, resolver: Arc<dyn VideoResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn store(&self) -> &AudioStore {
        &self.store
    }

    /// Copy a local audio file into storage and probe it.
    pub async fn import_local(&self, source: &Path) -> Result<DraftExercise> {
        let ext = extension_of(&source.to_string_lossy()).unwrap_or_default();
        if !self.allowed_extensions.contains(&ext) {
            return Err(ValidationError::UnsupportedFormat(ext).into());
        }

        let file_name = AudioStore::generate_name(&ext);
        let stored = self.store.import_copy(source, &file_name).await?;
        info!("[acquire] imported {} as {}", source.display(), file_name);

        let fallback_title = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string();
        self.finish(file_name, stored, None, fallback_title).await
    }

    /// Download remote audio into storage. Video-platform URLs go through the resolver.
    pub async fn download_remote(
        &self,
        url: &str,
        title: Option<&str>,
        is_video_platform: bool,
    ) -> Result<DraftExercise> {
        self.download_remote_with_progress(url, title, is_video_platform, |_, _| {})
            .await
    }

    /// Like `download_remote`; `on_progress` receives (bytes_downloaded, total_bytes).
    pub async fn download_remote_with_progress<F>(
        &self,
        url: &str,
        title: Option<&str>,
        is_video_platform: bool,
        on_progress: F,
    ) -> Result<DraftExercise>
    where
        F: FnMut(u64, Option<u64>) + Send,
    {
        let (media_url, fallback_title) = if is_video_platform {
            let video_id = extract_video_id(url)?;
            let resolver = self
                .resolver
                .as_ref()
                .ok_or(ValidationError::NoVideoResolver)?;
            debug!("[acquire] resolving video {}", video_id);
            (resolver.resolve(&video_id).await?, Some(video_id))
        } else {
            let parsed = Url::parse(url.trim())
                .map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ValidationError::InvalidUrl(url.to_string()).into());
            }
            (parsed, None)
        };

        let fetched = self.fetch(media_url, on_progress).await?;
        let fallback_title = fetched
            .suggested
            .as_deref()
            .and_then(file_stem)
            .or(fallback_title)
            .unwrap_or_else(|| "Downloaded audio".to_string());
        self.finish(
            fetched.file_name,
            fetched.path,
            title.map(str::to_string),
            fallback_title,
        )
        .await
    }

    async fn fetch<F>(&self, url: Url, mut on_progress: F) -> Result<Fetched>
    where
        F: FnMut(u64, Option<u64>) + Send,
    {
        let response = ensure_success(self.http.get(url.clone()).send().await?).await?;

        let suggested = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(suggested_filename)
            .or_else(|| {
                url.path_segments()
                    .and_then(|s| s.last())
                    .map(percent_decode)
                    .filter(|name| extension_of(name).is_some())
            })
            .map(|name| sanitize_file_name(&name));
        let mime_ext = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(extension_for_mime);

        let file_name = match &suggested {
            Some(name) => {
                let known_ext = extension_of(name)
                    .map_or(false, |ext| mime_for_extension(&ext) != DEFAULT_MIME);
                let name = match mime_ext {
                    Some(ext) if !known_ext => format!("{}.{}", name, ext),
                    _ => name.clone(),
                };
                format!("{}_{}", &Uuid::new_v4().simple().to_string()[..8], name)
            }
            None => AudioStore::generate_name(mime_ext.unwrap_or(DEFAULT_DOWNLOAD_EXTENSION)),
        };

        let total_bytes = response.content_length();
        let temp = self.store.temp_path();
        let written = async {
            let mut file = tokio::fs::File::create(&temp).await?;
            let mut stream = response.bytes_stream();
            let mut downloaded: u64 = 0;
            while let Some(chunk) = stream.next().await {
                let bytes = chunk?;
                file.write_all(&bytes).await?;
                downloaded += bytes.len() as u64;
                on_progress(downloaded, total_bytes);
            }
            file.flush().await?;
            Ok::<_, PipelineError>(())
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        let path = self.store.commit(&temp, &file_name).await?;
        info!("[acquire] downloaded {} as {}", url, file_name);
        Ok(Fetched {
            file_name,
            path,
            suggested,
        })
    }

    async fn finish(
        &self,
        file_name: String,
        path: PathBuf,
        title: Option<String>,
        fallback_title: String,
    ) -> Result<DraftExercise> {
        let metadata = match probe_stored(path.clone()).await {
            Ok(m) => m,
            Err(e) => {
                warn!("[acquire] probe failed for {}: {}", file_name, e);
                let _ = self.store.remove(&file_name).await;
                return Err(e);
            }
        };
        let title = title
            .filter(|t| !t.trim().is_empty())
            .or(metadata.title)
            .unwrap_or(fallback_title);
        Ok(DraftExercise {
            id: Uuid::new_v4(),
            title,
            artist: metadata.artist,
            album: metadata.album,
            audio_file_name: file_name,
            audio_path: path,
            duration: metadata.duration,
        })
    }
}

async fn probe_stored(path: PathBuf) -> Result<AudioMetadata> {
    tokio::task::spawn_blocking(move || probe_file(&path))
        .await
        .map_err(|e| PipelineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}
