//! Server state and configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::crop::{CroppedImage, SourceImage};
use crate::render::text::FontBook;

/// Uploads and crops are dropped after this much inactivity.
pub const SESSION_EXPIRATION_SECS: u64 = 60 * 60;

/// Largest accepted upload body.
pub const UPLOAD_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Directories scanned for caption fonts.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            font_dirs: vec![PathBuf::from("fonts"), PathBuf::from("/usr/share/fonts")],
        }
    }
}

/// A stored value plus the last time a request used it.
#[derive(Debug, Clone)]
pub struct Session<T> {
    pub value: T,
    pub last_accessed: Instant,
}

impl<T> Session<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            last_accessed: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }

    fn is_expired(&self, now: Instant, expiration: Duration) -> bool {
        now.duration_since(self.last_accessed) >= expiration
    }
}

pub type SessionMap<T> = RwLock<HashMap<Uuid, Session<T>>>;

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub fonts: Arc<FontBook>,
    /// Decoded uploads, keyed by image id.
    pub sources: SessionMap<SourceImage>,
    /// Confirmed crops, keyed by the id of the image they came from.
    pub crops: SessionMap<CroppedImage>,
}

async fn fetch<T: Clone>(map: &SessionMap<T>, id: &Uuid) -> Option<T> {
    let mut sessions = map.write().await;
    let session = sessions.get_mut(id)?;
    session.touch();
    Some(session.value.clone())
}

async fn sweep_map<T>(map: &SessionMap<T>, now: Instant, expiration: Duration) -> usize {
    let mut sessions = map.write().await;
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_expired(now, expiration));
    before - sessions.len()
}

impl AppState {
    pub fn new(config: ServerConfig, fonts: FontBook) -> Self {
        Self {
            config,
            fonts: Arc::new(fonts),
            sources: RwLock::new(HashMap::new()),
            crops: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert_source(&self, id: Uuid, image: SourceImage) {
        self.sources.write().await.insert(id, Session::new(image));
    }

    pub async fn insert_crop(&self, id: Uuid, image: CroppedImage) {
        self.crops.write().await.insert(id, Session::new(image));
    }

    /// Look up an upload and keep it alive.
    pub async fn source(&self, id: &Uuid) -> Option<SourceImage> {
        fetch(&self.sources, id).await
    }

    /// Look up a crop and keep it alive.
    pub async fn crop(&self, id: &Uuid) -> Option<CroppedImage> {
        fetch(&self.crops, id).await
    }

    /// Drop sessions idle for longer than `expiration`. Returns
    /// `(sources, crops)` removed.
    pub async fn sweep(&self, now: Instant, expiration: Duration) -> (usize, usize) {
        let sources = sweep_map(&self.sources, now, expiration).await;
        let crops = sweep_map(&self.crops, now, expiration).await;
        (sources, crops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::CropSpec;
    use image::{DynamicImage, RgbImage, RgbaImage};

    fn state() -> AppState {
        AppState::new(ServerConfig::default(), FontBook::empty())
    }

    #[tokio::test]
    async fn test_fetch_touches_session() {
        let state = state();
        let id = Uuid::new_v4();
        state
            .insert_source(id, SourceImage::new("a", DynamicImage::ImageRgb8(RgbImage::new(4, 4))))
            .await;
        let before = state.sources.read().await[&id].last_accessed;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(state.source(&id).await.is_some());
        let after = state.sources.read().await[&id].last_accessed;
        assert!(after > before);
        assert!(state.source(&Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_drops_idle_sessions() {
        let state = state();
        let id = Uuid::new_v4();
        let crop = CroppedImage::from_raster("a", RgbaImage::new(2, 2), CropSpec::new(0.0, 0.0, 2.0, 2.0));
        state.insert_crop(id, crop).await;

        let now = Instant::now();
        assert_eq!(state.sweep(now, Duration::from_secs(SESSION_EXPIRATION_SECS)).await, (0, 0));
        let later = now + Duration::from_secs(SESSION_EXPIRATION_SECS + 1);
        assert_eq!(state.sweep(later, Duration::from_secs(SESSION_EXPIRATION_SECS)).await, (0, 1));
        assert!(state.crop(&id).await.is_none());
    }
}
