//! File-backed collaborators used by the command line tool.
//!
//! [`FileFrameSource`] replays pre-encoded images at a fixed frame rate and
//! [`DirectorySink`] stores every received image as its own file.

use std::{
    io,
    num::NonZeroU32,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use tokio::time::{Interval, MissedTickBehavior, interval};

use crate::{
    chunk::ImageId,
    codec::{FrameSource, ImageSink},
};

/// Frame rate used when none is configured.
pub const DEFAULT_FPS: u32 = 30;

/// Cycles through a list of encoded image files at a fixed rate.
#[derive(Debug)]
pub struct FileFrameSource {
    paths: Vec<PathBuf>,
    period: Duration,
    ticker: Option<Interval>,
    next: usize,
}

impl FileFrameSource {
    /// Create a source replaying `paths` in order at `fps` frames per second.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] when `paths` is empty.
    pub fn new(paths: Vec<PathBuf>, fps: NonZeroU32) -> io::Result<Self> {
        if paths.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "at least one image file is required",
            ));
        }
        Ok(Self {
            paths,
            period: Duration::from_secs(1) / fps.get(),
            ticker: None,
            next: 0,
        })
    }

    /// Time between two captures.
    #[must_use]
    pub const fn period(&self) -> Duration { self.period }
}

#[async_trait]
impl FrameSource for FileFrameSource {
    type Frame = Bytes;
    type Error = io::Error;

    async fn capture(&mut self) -> Result<Bytes, io::Error> {
        let period = self.period;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });
        ticker.tick().await;

        let path = &self.paths[self.next % self.paths.len()];
        self.next = self.next.wrapping_add(1);
        let bytes = tokio::fs::read(path).await?;
        debug!("captured {} bytes from {}", bytes.len(), path.display());
        Ok(Bytes::from(bytes))
    }
}

/// Writes each received image into a directory as `<sequence>-<image id>.<ext>`.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    extension: String,
    written: u64,
}

impl DirectorySink {
    /// Create a sink writing into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns any error raised while creating the directory.
    pub async fn create(dir: impl Into<PathBuf>, extension: impl Into<String>) -> io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            extension: extension.into(),
            written: 0,
        })
    }

    /// Directory receiving the images.
    #[must_use]
    pub fn dir(&self) -> &Path { &self.dir }

    /// Number of images written so far.
    #[must_use]
    pub const fn written(&self) -> u64 { self.written }

    fn path_for(&self, image_id: ImageId) -> PathBuf {
        self.dir.join(format!(
            "{:08}-{:03}.{}",
            self.written,
            image_id.get(),
            self.extension
        ))
    }
}

#[async_trait]
impl ImageSink for DirectorySink {
    type Frame = Bytes;
    type Error = io::Error;

    async fn on_image_ready(&mut self, image_id: ImageId, frame: Bytes) -> Result<(), io::Error> {
        let path = self.path_for(image_id);
        tokio::fs::write(&path, &frame).await?;
        self.written += 1;
        debug!("stored image_id={image_id} ({} bytes) at {}", frame.len(), path.display());
        Ok(())
    }
}
