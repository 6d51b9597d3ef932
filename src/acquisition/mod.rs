//! Audio acquisition: local import, remote download, durable storage.

mod manager;
mod media;
mod store;
mod video;

pub use manager::{suggested_filename, AcquisitionManager};
pub use media::{extension_for_mime, mime_for_extension, probe_file, AudioMetadata};
pub use store::AudioStore;
pub use video::{extract_video_id, TemplateResolver, VideoResolver};
