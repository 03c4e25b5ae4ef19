// Last-known-good copies of the feeds on local disk
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FeedCache {
    dir: PathBuf,
}

impl FeedCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, source_id: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", source_id))
    }

    /// Overwrite the cached copy for `source_id`
    pub async fn write(&self, source_id: &str, body: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Replaced atomically via a sibling temp file
        let path = self.path_for(source_id);
        let tmp = path.with_extension("csv.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await
    }

    pub async fn read(&self, source_id: &str) -> io::Result<String> {
        tokio::fs::read_to_string(self.path_for(source_id)).await
    }
}
