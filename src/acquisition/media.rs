//! Probe stored audio for duration and tags.

use crate::error::{Result, ValidationError};
use std::path::Path;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey, Tag};
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioMetadata {
    pub duration: f64,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

fn unreadable(err: impl std::fmt::Display) -> ValidationError {
    ValidationError::UnreadableAudio(err.to_string())
}

fn seconds(time_base: TimeBase, ts: u64) -> f64 {
    let t = time_base.calc_time(ts);
    t.seconds as f64 + t.frac
}

/// Blocking probe; call from `spawn_blocking` in async code.
pub fn probe_file(path: &Path) -> Result<AudioMetadata> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(unreadable)?;

    let mut tags: Vec<Tag> = Vec::new();
    if let Some(meta) = probed.metadata.get() {
        if let Some(rev) = meta.current() {
            tags.extend(rev.tags().iter().cloned());
        }
    }
    let mut format = probed.format;
    if let Some(rev) = format.metadata().current() {
        tags.extend(rev.tags().iter().cloned());
    }

    let track = format
        .default_track()
        .ok_or_else(|| unreadable("no audio track"))?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    let time_base = params
        .time_base
        .or_else(|| params.sample_rate.map(|rate| TimeBase::new(1, rate)))
        .ok_or_else(|| unreadable("unknown time base"))?;

    let duration = match params.n_frames {
        Some(frames) => seconds(time_base, frames),
        None => {
            // No frame count in the header: walk the packets.
            let mut total: u64 = 0;
            loop {
                match format.next_packet() {
                    Ok(packet) if packet.track_id() == track_id => total += packet.dur(),
                    Ok(_) => {}
                    Err(SymphoniaError::IoError(e))
                        if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                    {
                        break
                    }
                    Err(e) => return Err(unreadable(e).into()),
                }
            }
            seconds(time_base, total)
        }
    };

    Ok(AudioMetadata {
        duration: duration.max(0.0),
        title: tag_value(&tags, StandardTagKey::TrackTitle),
        artist: tag_value(&tags, StandardTagKey::Artist),
        album: tag_value(&tags, StandardTagKey::Album),
    })
}

fn tag_value(tags: &[Tag], key: StandardTagKey) -> Option<String> {
    tags.iter()
        .find(|t| t.std_key == Some(key))
        .map(|t| t.value.to_string().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Upload type for extensions we do not recognize.
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// MIME type sent with uploads.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "caf" => "audio/x-caf",
        _ => DEFAULT_MIME,
    }
}

/// Extension implied by a Content-Type header, if it is an audio type we know.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let base = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match base.as_str() {
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("wav"),
        "audio/mp4" | "audio/x-m4a" => Some("m4a"),
        "audio/aac" => Some("aac"),
        "video/mp4" => Some("mp4"),
        "audio/x-caf" => Some("caf"),
        _ => None,
    }
}
