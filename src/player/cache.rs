//! LRU disk cache for fetched media bytes
//!
//! One cache directory is shared by every player in the process. Entries are whole media
//! files named by the SHA-256 of their URL; writes land in a `.part` file and are renamed
//! into place on commit, so a reader never sees a partial entry.
//!
//! The in-memory LRU index (entry sizes in recency order) is rebuilt from the directory
//! listing on open, using file mtime as the initial recency.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use bytes::Bytes;
use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const CACHE_SUBDIR: &str = "reels_downloads/media";
pub const CACHE_SIZE: u64 = 50 * 1024 * 1024;
const PART_EXTENSION: &str = "part";

static SHARED_CACHE: OnceLock<Arc<MediaCache>> = OnceLock::new();
static WRITER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Entry sizes in recency order, plus the running byte total.
///
/// Unbounded by count; capacity is enforced in bytes by [`CacheIndex::evict_to`].
struct CacheIndex {
    entries: LruCache<String, u64>,
    total_bytes: u64,
}

impl CacheIndex {
    fn new() -> Self {
        Self {
            entries: LruCache::unbounded(),
            total_bytes: 0,
        }
    }

    /// Mark `key` most recently used. False if it is not indexed.
    fn touch(&mut self, key: &str) -> bool {
        self.entries.get(key).is_some()
    }

    fn insert(&mut self, key: String, size: u64) {
        if let Some(old) = self.entries.put(key, size) {
            self.total_bytes -= old;
        }
        self.total_bytes += size;
    }

    fn remove(&mut self, key: &str) {
        if let Some(old) = self.entries.pop(key) {
            self.total_bytes -= old;
        }
    }

    /// Drop least-recently-used entries until the total fits; returns the evicted keys.
    fn evict_to(&mut self, capacity: u64) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.total_bytes > capacity {
            match self.entries.pop_lru() {
                Some((key, size)) => {
                    self.total_bytes -= size;
                    evicted.push(key);
                }
                None => break,
            }
        }
        evicted
    }
}

/// Capacity-bounded disk cache with least-recently-used eviction.
pub struct MediaCache {
    dir: PathBuf,
    capacity: u64,
    index: Mutex<CacheIndex>,
}

impl MediaCache {
    /// Open (or create) the cache under `base/reels_downloads/media`.
    pub fn open(base: &Path, capacity: u64) -> io::Result<Self> {
        let dir = base.join(CACHE_SUBDIR);
        std::fs::create_dir_all(&dir)?;

        let mut found = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();

            // Leftovers from writers that never committed
            if path.extension().is_some_and(|ext| ext == PART_EXTENSION) {
                let _ = std::fs::remove_file(&path);
                continue;
            }

            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let Some(key) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((modified, key, metadata.len()));
        }

        // Oldest first so recency order matches mtime order
        found.sort_by_key(|(modified, _, _)| *modified);

        let mut index = CacheIndex::new();
        for (_, key, size) in found {
            index.insert(key, size);
        }
        for key in index.evict_to(capacity) {
            let _ = std::fs::remove_file(dir.join(key));
        }

        tracing::debug!(
            dir = %dir.display(),
            entries = index.entries.len(),
            total_bytes = index.total_bytes,
            capacity,
            "Media cache opened"
        );

        Ok(Self {
            dir,
            capacity,
            index: Mutex::new(index),
        })
    }

    /// The process-wide cache, created on first call and never torn down.
    ///
    /// `base` is only consulted by the call that creates the instance.
    pub fn shared(base: &Path) -> io::Result<Arc<MediaCache>> {
        if let Some(cache) = SHARED_CACHE.get() {
            return Ok(Arc::clone(cache));
        }
        let cache = Arc::new(MediaCache::open(base, CACHE_SIZE)?);
        Ok(Arc::clone(SHARED_CACHE.get_or_init(|| cache)))
    }

    pub fn key_for(url: &str) -> String {
        hex::encode(Sha256::digest(url.as_bytes()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub async fn total_bytes(&self) -> u64 {
        self.index.lock().await.total_bytes
    }

    pub async fn len(&self) -> usize {
        self.index.lock().await.entries.len()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.index.lock().await.entries.contains(&Self::key_for(url))
    }

    /// Read a complete entry, bumping its recency. `Ok(None)` is a miss.
    pub async fn read(&self, url: &str) -> io::Result<Option<Bytes>> {
        let key = Self::key_for(url);
        if !self.index.lock().await.touch(&key) {
            return Ok(None);
        }

        match tokio::fs::read(self.dir.join(&key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Removed behind our back; forget it
                self.index.lock().await.remove(&key);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Start writing a new entry for `url`.
    pub async fn writer(&self, url: &str) -> io::Result<CacheWriter> {
        let key = Self::key_for(url);
        let seq = WRITER_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self.dir.join(format!("{}.{}.{}", key, seq, PART_EXTENSION));
        let file = tokio::fs::File::create(&tmp_path).await?;

        Ok(CacheWriter {
            key,
            tmp_path,
            file: Some(file),
            written: 0,
            committed: false,
        })
    }

    /// Publish a finished entry and evict down to capacity.
    ///
    /// Returns `false` when the entry alone exceeds the capacity and was discarded.
    pub async fn commit(&self, mut writer: CacheWriter) -> io::Result<bool> {
        if let Some(mut file) = writer.file.take() {
            file.flush().await?;
        }
        let key = writer.key.clone();
        let written = writer.written;

        if written > self.capacity {
            tracing::debug!(key = %key, size = written, "Entry larger than cache capacity, not stored");
            return Ok(false);
        }

        tokio::fs::rename(&writer.tmp_path, self.dir.join(&key)).await?;
        writer.committed = true;

        let evicted = {
            let mut index = self.index.lock().await;
            index.insert(key.clone(), written);
            index.evict_to(self.capacity)
        };

        for victim in evicted {
            tracing::debug!(key = %victim, "Evicting cache entry");
            if let Err(e) = tokio::fs::remove_file(self.dir.join(&victim)).await {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(key = %victim, error = %e, "Failed to remove evicted cache entry");
                }
            }
        }

        tracing::trace!(key = %key, size = written, "Cache entry committed");
        Ok(true)
    }
}

/// An entry being written; nothing is visible to readers until [`MediaCache::commit`].
///
/// Dropping an uncommitted writer deletes its `.part` file, so a download cut short by a
/// cancelled load never outlives the load.
pub struct CacheWriter {
    key: String,
    tmp_path: PathBuf,
    file: Option<tokio::fs::File>,
    written: u64,
    committed: bool,
}

impl CacheWriter {
    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("cache writer already closed"))?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Discard the partial entry.
    pub fn abandon(self) {
        tracing::trace!(key = %self.key, written = self.written, "Cache write abandoned");
    }
}

impl Drop for CacheWriter {
    fn drop(&mut self) {
        // Close before removing; some platforms refuse to unlink an open file
        drop(self.file.take());
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.tmp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.tmp_path.display(), error = %e, "Failed to remove partial cache file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store(cache: &MediaCache, url: &str, data: &[u8]) -> bool {
        let mut writer = cache.writer(url).await.unwrap();
        writer.write(data).await.unwrap();
        cache.commit(writer).await.unwrap()
    }

    #[tokio::test]
    async fn miss_then_hit_after_commit() {
        let tmp = TempDir::new().unwrap();
        let cache = MediaCache::open(tmp.path(), 1024).unwrap();

        assert!(cache.read("https://cdn/a.mp4").await.unwrap().is_none());
        assert!(store(&cache, "https://cdn/a.mp4", b"hello").await);

        let data = cache.read("https://cdn/a.mp4").await.unwrap().unwrap();
        assert_eq!(&data[..], b"hello");
        assert_eq!(cache.total_bytes().await, 5);
        assert!(tmp.path().join(CACHE_SUBDIR).join(MediaCache::key_for("https://cdn/a.mp4")).exists());
    }

    #[tokio::test]
    async fn evicts_least_recently_used_first() {
        let tmp = TempDir::new().unwrap();
        let cache = MediaCache::open(tmp.path(), 10).unwrap();

        store(&cache, "a", b"aaaa").await;
        store(&cache, "b", b"bbbb").await;
        // Touch a so b becomes the oldest
        cache.read("a").await.unwrap();
        store(&cache, "c", b"cccc").await;

        assert!(cache.contains("a").await);
        assert!(!cache.contains("b").await);
        assert!(cache.contains("c").await);
        assert_eq!(cache.total_bytes().await, 8);
        assert!(!cache.dir().join(MediaCache::key_for("b")).exists());
    }

    #[tokio::test]
    async fn oversized_entry_is_not_stored() {
        let tmp = TempDir::new().unwrap();
        let cache = MediaCache::open(tmp.path(), 4).unwrap();

        assert!(!store(&cache, "big", b"too large").await);
        assert_eq!(cache.len().await, 0);
        assert_eq!(std::fs::read_dir(cache.dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn abandoned_writer_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let cache = MediaCache::open(tmp.path(), 1024).unwrap();

        let mut writer = cache.writer("a").await.unwrap();
        writer.write(b"partial").await.unwrap();
        writer.abandon();

        assert!(cache.read("a").await.unwrap().is_none());
        assert_eq!(std::fs::read_dir(cache.dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn dropped_writer_removes_its_part_file() {
        let tmp = TempDir::new().unwrap();
        let cache = MediaCache::open(tmp.path(), 1024).unwrap();

        let mut writer = cache.writer("a").await.unwrap();
        writer.write(b"half a video").await.unwrap();
        assert_eq!(std::fs::read_dir(cache.dir()).unwrap().count(), 1);

        drop(writer);
        assert_eq!(std::fs::read_dir(cache.dir()).unwrap().count(), 0);
        assert!(!cache.contains("a").await);
    }

    #[tokio::test]
    async fn reopen_rebuilds_index_and_drops_stale_parts() {
        let tmp = TempDir::new().unwrap();
        {
            let cache = MediaCache::open(tmp.path(), 1024).unwrap();
            store(&cache, "a", b"12345").await;
        }
        let stale = tmp.path().join(CACHE_SUBDIR).join("deadbeef.0.part");
        std::fs::write(&stale, b"junk").unwrap();

        let cache = MediaCache::open(tmp.path(), 1024).unwrap();
        assert!(cache.contains("a").await);
        assert_eq!(cache.total_bytes().await, 5);
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn missing_file_is_treated_as_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = MediaCache::open(tmp.path(), 1024).unwrap();
        store(&cache, "a", b"data").await;
        std::fs::remove_file(cache.dir().join(MediaCache::key_for("a"))).unwrap();

        assert!(cache.read("a").await.unwrap().is_none());
        assert!(!cache.contains("a").await);
        assert_eq!(cache.total_bytes().await, 0);
    }

    #[test]
    fn shared_instance_is_created_once() {
        let tmp = TempDir::new().unwrap();
        let first = MediaCache::shared(tmp.path()).unwrap();
        let second = MediaCache::shared(Path::new("/nonexistent/elsewhere")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.capacity(), CACHE_SIZE);
    }
}
