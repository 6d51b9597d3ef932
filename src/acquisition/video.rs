//! Video-platform URL recognition and media resolution.

use crate::error::{Result, ValidationError};
use async_trait::async_trait;
use reqwest::Url;

const VIDEO_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
    "www.youtu.be",
];

/// Path prefixes on the long host that carry the id as the next segment.
const ID_PATH_PREFIXES: &[&str] = &["shorts", "embed", "live", "v"];

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Pull the video identifier out of `?v=<id>` or `host/<id>`.
pub fn extract_video_id(raw: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidUrl(raw.to_string());
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?.to_ascii_lowercase();
    if !VIDEO_HOSTS.contains(&host.as_str()) {
        return Err(invalid());
    }

    if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "v") {
        if is_valid_id(&id) {
            return Ok(id.into_owned());
        }
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    let candidate = match segments.as_slice() {
        [id] if host.ends_with("youtu.be") => Some(*id),
        [prefix, id, ..] if ID_PATH_PREFIXES.contains(prefix) => Some(*id),
        _ => None,
    };
    candidate
        .filter(|id| is_valid_id(id))
        .map(str::to_string)
        .ok_or_else(invalid)
}

/// Maps a video identifier to a directly downloadable media URL.
#[async_trait]
pub trait VideoResolver: Send + Sync {
    async fn resolve(&self, video_id: &str) -> Result<Url>;
}

/// Substitutes the id into a URL template such as `https://media.example/{id}.m4a`.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    template: String,
}

impl TemplateResolver {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

#[async_trait]
impl VideoResolver for TemplateResolver {
    async fn resolve(&self, video_id: &str) -> Result<Url> {
        let url = self.template.replace("{id}", video_id);
        Url::parse(&url).map_err(|_| ValidationError::InvalidUrl(url).into())
    }
}
