//! Display-local references to image bytes.
//!
//! Each acquired image is written to its own file under the store directory
//! and the returned [`ImageHandle`] deletes it again when dropped, so a
//! screen holding `Option<ImageHandle>` releases the previous image simply by
//! assigning a new one.
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// `{data_dir}/media/display`
    pub fn in_data_dir(data_dir: &str) -> std::io::Result<Self> {
        Self::new(Path::new(data_dir).join("media").join("display"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn acquire(&self, bytes: &[u8]) -> std::io::Result<ImageHandle> {
        let path = self
            .dir
            .join(format!("{}.{}", Uuid::new_v4(), sniff_extension(bytes)));
        tokio::fs::write(&path, bytes).await?;
        debug!(path=%path.display(), len = bytes.len(), "acquired image handle");
        Ok(ImageHandle { path })
    }
}

/// Owning reference to a displayed image; released on drop.
#[derive(PartialEq, Eq)]
pub struct ImageHandle {
    path: PathBuf,
}

impl ImageHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reference(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImageHandle").field(&self.path).finish()
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path=%self.path.display(), "released image handle"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(?err, path=%self.path.display(), "failed to release image handle"),
        }
    }
}

fn sniff_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        "jpg"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else {
        "bin"
    }
}
