use std::path::PathBuf;

use crate::error::GuidanceError;

pub const STATIC_URL_PREFIX: &str = "/static";

/// Writes generated images under the static directory served at `/static`.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persists `bytes` as `<root>/<category>/<prefix>_<uuid>.png` and returns
    /// its public URL.
    pub async fn persist_png(
        &self,
        category: &str,
        prefix: &str,
        bytes: &[u8],
    ) -> Result<String, GuidanceError> {
        let dir = self.root.join(category);
        tokio::fs::create_dir_all(&dir).await?;
        let filename = format!("{prefix}_{}.png", uuid::Uuid::new_v4().simple());
        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "asset persisted");
        Ok(format!("{STATIC_URL_PREFIX}/{category}/{filename}"))
    }

    /// Maps a `/static/...` URL back to its file under the root.
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(STATIC_URL_PREFIX)?.trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|segment| segment == "..") {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn persists_under_category_and_returns_static_url() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = AssetStore::new(temp.path());

        let url = store.persist_png("effects", "video_fx", b"png-bytes").await?;
        assert!(url.starts_with("/static/effects/video_fx_"));
        assert!(url.ends_with(".png"));

        let path = store.path_for_url(&url).expect("path for url");
        assert_eq!(tokio::fs::read(&path).await?, b"png-bytes");
        Ok(())
    }

    #[tokio::test]
    async fn unwritable_root_is_a_storage_error() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, b"")?;
        let store = AssetStore::new(&blocker);

        let err = store.persist_png("edits", "edit", b"png").await.err();
        assert!(matches!(err, Some(GuidanceError::Storage(_))));
        Ok(())
    }

    #[test]
    fn rejects_urls_outside_the_store() {
        let store = AssetStore::new("static");
        assert_eq!(store.path_for_url("/other/file.png"), None);
        assert_eq!(store.path_for_url("/static/../secret"), None);
    }
}
