use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

/// Cached text lives this long before the next load re-reads the file.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
const MAX_LOAD_ATTEMPTS: u32 = 3;

/// The text file families the engine loads, each with its own subdirectory
/// and extension under the asset root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Level,
    Tiledefs,
    Ani,
}

impl FileKind {
    fn subdir(self) -> &'static str {
        match self {
            FileKind::Level => "levels",
            FileKind::Tiledefs => "tiledefs",
            FileKind::Ani => "janis",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            FileKind::Level => "nw",
            FileKind::Tiledefs => "tdefs",
            FileKind::Ani => "jani",
        }
    }
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read {path} after {attempts} attempts: {source}")]
    ReadFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
struct CachedText {
    data: Arc<str>,
    expires_at: Instant,
}

/// Expiring text-file cache keyed by resolved path. A hit serves the cached
/// contents without touching the filesystem; a miss reads with a bounded
/// retry before reporting a `ResourceError`. The game loop is
/// single-threaded, so at most one load per key is ever in flight and
/// cache insert-or-reuse stays idempotent.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    ttl: Duration,
    cache: HashMap<PathBuf, CachedText>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_ttl(root, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl,
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: FileKind, name: &str) -> PathBuf {
        self.root
            .join(kind.subdir())
            .join(format!("{name}.{}", kind.extension()))
    }

    pub fn load_text(&mut self, kind: FileKind, name: &str) -> Result<Arc<str>, ResourceError> {
        let path = self.path_for(kind, name);
        let now = Instant::now();

        if let Some(cached) = self.cache.get(&path) {
            if cached.expires_at > now {
                debug!(path = %path.display(), "file_cache_hit");
                return Ok(Arc::clone(&cached.data));
            }
        }

        let mut last_error = None;
        for attempt in 1..=MAX_LOAD_ATTEMPTS {
            match fs::read_to_string(&path) {
                Ok(text) => {
                    let data: Arc<str> = Arc::from(text);
                    self.cache.insert(
                        path,
                        CachedText {
                            data: Arc::clone(&data),
                            expires_at: now + self.ttl,
                        },
                    );
                    return Ok(data);
                }
                Err(error) => {
                    warn!(path = %path.display(), attempt, %error, "file_read_failed");
                    last_error = Some(error);
                }
            }
        }
        Err(ResourceError::ReadFailed {
            path,
            attempts: MAX_LOAD_ATTEMPTS,
            source: last_error
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "no attempts")),
        })
    }

    /// Drop a cache entry so the next load re-reads from disk.
    pub fn invalidate(&mut self, kind: FileKind, name: &str) {
        let path = self.path_for(kind, name);
        self.cache.remove(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_level(dir: &Path, name: &str, contents: &str) {
        let levels = dir.join("levels");
        fs::create_dir_all(&levels).expect("mkdir");
        fs::write(levels.join(format!("{name}.nw")), contents).expect("write");
    }

    #[test]
    fn resolves_kind_specific_paths() {
        let store = FileStore::new("/assets");
        assert_eq!(
            store.path_for(FileKind::Tiledefs, "pics1"),
            PathBuf::from("/assets/tiledefs/pics1.tdefs")
        );
        assert_eq!(
            store.path_for(FileKind::Ani, "walk"),
            PathBuf::from("/assets/janis/walk.jani")
        );
    }

    #[test]
    fn serves_cached_contents_without_rereading() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_level(dir.path(), "level1", "first");
        let mut store = FileStore::new(dir.path());

        assert_eq!(&*store.load_text(FileKind::Level, "level1").expect("load"), "first");
        // The file changes on disk, but the cache is still fresh.
        write_level(dir.path(), "level1", "second");
        assert_eq!(&*store.load_text(FileKind::Level, "level1").expect("load"), "first");
    }

    #[test]
    fn invalidate_forces_a_reread() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_level(dir.path(), "level1", "first");
        let mut store = FileStore::new(dir.path());
        store.load_text(FileKind::Level, "level1").expect("load");

        write_level(dir.path(), "level1", "second");
        store.invalidate(FileKind::Level, "level1");
        assert_eq!(&*store.load_text(FileKind::Level, "level1").expect("load"), "second");
    }

    #[test]
    fn expired_entries_are_reloaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_level(dir.path(), "level1", "first");
        let mut store = FileStore::with_ttl(dir.path(), Duration::ZERO);
        store.load_text(FileKind::Level, "level1").expect("load");

        write_level(dir.path(), "level1", "second");
        assert_eq!(&*store.load_text(FileKind::Level, "level1").expect("load"), "second");
    }

    #[test]
    fn missing_file_errors_after_bounded_attempts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::new(dir.path());
        let error = store
            .load_text(FileKind::Level, "ghost")
            .expect_err("missing");
        let ResourceError::ReadFailed { attempts, .. } = error;
        assert_eq!(attempts, MAX_LOAD_ATTEMPTS);
    }
}
