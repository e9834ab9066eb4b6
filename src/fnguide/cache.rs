// src/fnguide/cache.rs
use std::fs;
use std::path::{Path, PathBuf};

use super::models::DocumentKind;
use super::DocumentSource;
use crate::utils::error::{FetchError, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub code: String,
    pub kind: DocumentKind,
}

impl CacheKey {
    pub fn new(code: &str, kind: DocumentKind) -> Self {
        Self { code: code.to_string(), kind }
    }
}

/// Storage for raw page bodies.
#[async_trait::async_trait]
pub trait DocumentCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<String>;
    async fn put(&self, key: &CacheKey, body: &str) -> Result<(), StorageError>;
}

/// On-disk cache partitioned by month: `{root}/{prefix}{YYYY-MM}/{file}`.
/// Pages fetched in an earlier month are never served.
#[derive(Debug, Clone)]
pub struct MonthlyCache {
    root: PathBuf,
    month: String,
}

impl MonthlyCache {
    /// `month` is `YYYY-MM`.
    pub fn new<P: AsRef<Path>>(root: P, month: &str) -> Self {
        Self { root: root.as_ref().to_path_buf(), month: month.to_string() }
    }

    pub fn for_current_month<P: AsRef<Path>>(root: P) -> Self {
        let month = chrono::Local::now().format("%Y-%m").to_string();
        Self::new(root, &month)
    }

    fn dir_name(&self, kind: DocumentKind) -> String {
        format!("{}{}", kind.cache_prefix(), self.month)
    }

    pub fn path(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(self.dir_name(key.kind))
            .join(key.kind.cache_file_name(&key.code))
    }

    /// Removes `kind`'s cache directories of every other month. Returns how many were removed.
    pub fn evict_stale(&self, kind: DocumentKind) -> Result<usize, StorageError> {
        if !self.root.exists() {
            return Ok(0);
        }

        let current = self.dir_name(kind);
        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let is_month_dir = name
                .strip_prefix(kind.cache_prefix())
                .is_some_and(|month| month.len() == 7 && month.as_bytes()[4] == b'-');
            if is_month_dir && name != current && entry.path().is_dir() {
                fs::remove_dir_all(entry.path())?;
                tracing::info!("Evicted stale cache directory {}", name);
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl DocumentCache for MonthlyCache {
    async fn get(&self, key: &CacheKey) -> Option<String> {
        let path = self.path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => {
                tracing::trace!("Cache hit {}", path.display());
                Some(body)
            }
            Err(_) => None,
        }
    }

    async fn put(&self, key: &CacheKey, body: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        Ok(())
    }
}

/// A [`DocumentSource`] that consults a cache before the wrapped source.
pub struct CachedSource<S, C> {
    inner: S,
    cache: C,
}

impl<S, C> CachedSource<S, C> {
    pub fn new(inner: S, cache: C) -> Self {
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl<S: DocumentSource, C: DocumentCache> DocumentSource for CachedSource<S, C> {
    async fn fetch(&self, code: &str, kind: DocumentKind) -> Result<String, FetchError> {
        let key = CacheKey::new(code, kind);
        if let Some(body) = self.cache.get(&key).await {
            return Ok(body);
        }

        let body = self.inner.fetch(code, kind).await?;
        if let Err(e) = self.cache.put(&key, &body).await {
            tracing::warn!("Failed to cache {} page for {}: {}", kind, code, e);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl DocumentSource for CountingSource {
        async fn fetch(&self, code: &str, kind: DocumentKind) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("<html>{} {}</html>", code, kind))
        }
    }

    #[test]
    fn paths_are_partitioned_by_kind_and_month() {
        let cache = MonthlyCache::new("/tmp/derived", "2024-05");
        let path = cache.path(&CacheKey::new("005930", DocumentKind::FinanceRatio));
        assert_eq!(path, PathBuf::from("/tmp/derived/fnguide_FinanceRatio_2024-05/005930.html"));
        let factor = cache.path(&CacheKey::new("005930", DocumentKind::MultiFactor));
        assert_eq!(factor, PathBuf::from("/tmp/derived/fnguide_InvestIdx_2024-05/factor_005930.json"));
    }

    #[tokio::test]
    async fn put_then_get_round_trips_body() {
        let dir = tempdir().unwrap();
        let cache = MonthlyCache::new(dir.path(), "2024-05");
        let key = CacheKey::new("000660", DocumentKind::Snapshot);
        assert!(cache.get(&key).await.is_none());
        cache.put(&key, "<html>SK하이닉스</html>").await.unwrap();
        assert_eq!(cache.get(&key).await.as_deref(), Some("<html>SK하이닉스</html>"));
        assert!(cache.path(&key).exists());
    }

    #[test]
    fn eviction_only_touches_other_months_of_the_same_kind() {
        let dir = tempdir().unwrap();
        for name in [
            "fnguide_snapshot_2024-04",
            "fnguide_snapshot_2024-05",
            "fnguide_FinanceRatio_2024-04",
            "fnguide_snapshot_backup",
        ] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
        }

        let cache = MonthlyCache::new(dir.path(), "2024-05");
        assert_eq!(cache.evict_stale(DocumentKind::Snapshot).unwrap(), 1);
        assert!(!dir.path().join("fnguide_snapshot_2024-04").exists());
        assert!(dir.path().join("fnguide_snapshot_2024-05").exists());
        assert!(dir.path().join("fnguide_FinanceRatio_2024-04").exists());
        assert!(dir.path().join("fnguide_snapshot_backup").exists());
    }

    #[tokio::test]
    async fn cached_source_fetches_each_page_once() {
        let dir = tempdir().unwrap();
        let source = CachedSource::new(
            CountingSource { calls: AtomicUsize::new(0) },
            MonthlyCache::new(dir.path(), "2024-05"),
        );

        let first = source.fetch("005930", DocumentKind::Snapshot).await.unwrap();
        let second = source.fetch("005930", DocumentKind::Snapshot).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unwritable_cache_still_serves_fetched_page() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();
        let source = CachedSource::new(
            CountingSource { calls: AtomicUsize::new(0) },
            MonthlyCache::new(&blocker, "2024-05"),
        );

        let body = source.fetch("005930", DocumentKind::Finance).await.unwrap();
        assert!(body.contains("005930"));
        source.fetch("005930", DocumentKind::Finance).await.unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }
}
