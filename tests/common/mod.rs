#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};
use listening_lab::clock::{Clock, Sleeper};
use listening_lab::credentials::{BearerToken, TokenProvider};
use tokio::net::TcpListener;

pub const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/service_key.pem");
pub const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/service_key.pub.pem");

pub async fn start_server(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

/// A mono 16-bit WAV of the given length.
pub fn write_wav(path: &Path, seconds: f64) {
    let sample_rate = 8000;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let samples = (seconds * sample_rate as f64) as u32;
    for i in 0..samples {
        writer.write_sample(((i % 100) as i16 - 50) * 200).unwrap();
    }
    writer.finalize().unwrap();
}

pub fn write_service_account(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("service-account.json");
    let doc = serde_json::json!({
        "client_email": "listener@test-project.iam.gserviceaccount.com",
        "private_key": PRIVATE_KEY_PEM,
    });
    std::fs::write(&path, doc.to_string()).unwrap();
    path
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Records requested sleeps without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

pub struct StaticToken(pub Arc<BearerToken>);

impl StaticToken {
    pub fn new(value: &str) -> Self {
        Self(Arc::new(BearerToken {
            value: value.to_string(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        }))
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> listening_lab::Result<Arc<BearerToken>> {
        Ok(Arc::clone(&self.0))
    }
}

/// Core Audio file with 16-bit big-endian mono LPCM at 8 kHz.
pub fn write_caf(path: &Path, seconds: f64) {
    let sample_rate = 8000.0_f64;
    let frames = (seconds * sample_rate) as usize;
    let mut out = Vec::new();
    out.extend_from_slice(b"caff");
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());

    out.extend_from_slice(b"desc");
    out.extend_from_slice(&32i64.to_be_bytes());
    out.extend_from_slice(&sample_rate.to_be_bytes());
    out.extend_from_slice(b"lpcm");
    out.extend_from_slice(&0u32.to_be_bytes()); // big-endian integer samples
    out.extend_from_slice(&2u32.to_be_bytes()); // bytes per packet
    out.extend_from_slice(&1u32.to_be_bytes()); // frames per packet
    out.extend_from_slice(&1u32.to_be_bytes()); // channels
    out.extend_from_slice(&16u32.to_be_bytes()); // bits per channel

    out.extend_from_slice(b"data");
    out.extend_from_slice(&(4 + 2 * frames as i64).to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes()); // edit count
    for i in 0..frames {
        out.extend_from_slice(&(((i % 100) as i16 - 50) * 200).to_be_bytes());
    }
    std::fs::write(path, out).unwrap();
}

/// MPEG-1 Layer III stream of silent 128 kbit/s mono frames at 44.1 kHz.
pub fn write_mp3(path: &Path, seconds: f64) {
    const FRAME_LEN: usize = 417;
    const SAMPLES_PER_FRAME: f64 = 1152.0;
    let frames = (seconds * 44100.0 / SAMPLES_PER_FRAME).ceil() as usize;
    let mut out = Vec::with_capacity(frames * FRAME_LEN);
    for _ in 0..frames {
        let mut frame = vec![0u8; FRAME_LEN];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0xC0]);
        out.extend_from_slice(&frame);
    }
    std::fs::write(path, out).unwrap();
}

/// ADTS stream of AAC-LC mono frames at 44.1 kHz. Payloads are zeroed;
/// probing reads only the frame headers.
pub fn write_adts(path: &Path, seconds: f64) {
    const PAYLOAD_LEN: usize = 20;
    const SAMPLES_PER_FRAME: f64 = 1024.0;
    let frame_len = 7 + PAYLOAD_LEN;
    let frames = (seconds * 44100.0 / SAMPLES_PER_FRAME).ceil() as usize;
    let mut out = Vec::with_capacity(frames * frame_len);
    for _ in 0..frames {
        out.extend_from_slice(&[
            0xFF,
            0xF1,
            0x50,
            0x40 | ((frame_len >> 11) & 0x03) as u8,
            ((frame_len >> 3) & 0xFF) as u8,
            (((frame_len & 0x07) << 5) as u8) | 0x1F,
            0xFC,
        ]);
        out.extend_from_slice(&[0u8; PAYLOAD_LEN]);
    }
    std::fs::write(path, out).unwrap();
}
