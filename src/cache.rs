//! On-disk cache of completion texts keyed by request.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::chat::{CompletionClient, CompletionRequest};
use crate::error::SgptError;

const DEFAULT_CACHE_LENGTH: usize = 100;

/// Stores one file per cached answer and keeps at most `length` of them.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    length: usize,
}

impl ResponseCache {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            length: DEFAULT_CACHE_LENGTH,
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Stable key for a request: SHA-256 over its JSON encoding.
    pub fn key(request: &CompletionRequest) -> Result<String, SgptError> {
        let payload = serde_json::to_vec(request)
            .map_err(|err| SgptError::MalformedInput(err.to_string()))?;
        let digest = Sha256::digest(&payload);
        Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(key)).ok()
    }

    pub fn put(&self, key: &str, text: &str) -> Result<(), SgptError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(key), text)?;
        self.evict()
    }

    fn evict(&self) -> Result<(), SgptError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, entry.path()));
        }
        if entries.len() <= self.length {
            return Ok(());
        }
        entries.sort();
        let excess = entries.len() - self.length;
        for (_, path) in entries.into_iter().take(excess) {
            if let Err(err) = fs::remove_file(&path) {
                warn!("failed to evict {}: {err}", path.display());
            }
        }
        Ok(())
    }
}

/// Wraps a client and answers repeated requests from a [`ResponseCache`]
/// when the request allows it.
pub struct CachedClient<C> {
    inner: C,
    cache: ResponseCache,
}

impl<C> CachedClient<C> {
    pub fn new(inner: C, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<C: CompletionClient> CompletionClient for CachedClient<C> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, SgptError> {
        if !request.params.use_cache {
            return self.inner.complete(request).await;
        }
        let key = ResponseCache::key(request)?;
        if let Some(text) = self.cache.get(&key) {
            debug!("cache hit {key}");
            return Ok(text);
        }
        let text = self.inner.complete(request).await?;
        if let Err(err) = self.cache.put(&key, &text) {
            warn!("failed to cache completion: {err}");
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{CompletionParams, Message};
    use crate::testing::ScriptedClient;

    fn request(prompt: &str, use_cache: bool) -> CompletionRequest {
        let mut params = CompletionParams::new("gpt-4o");
        params.use_cache = use_cache;
        CompletionRequest::new(vec![Message::user().content(prompt).build()], params)
    }

    #[tokio::test]
    async fn repeated_request_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let inner = ScriptedClient::new(["first", "second"]);
        let client = CachedClient::new(inner.clone(), ResponseCache::new(dir.path().into()));

        assert_eq!(client.complete(&request("hi", true)).await.unwrap(), "first");
        assert_eq!(client.complete(&request("hi", true)).await.unwrap(), "first");
        assert_eq!(inner.requests().len(), 1);
    }

    #[tokio::test]
    async fn disabled_cache_always_calls_through() {
        let dir = tempfile::tempdir().unwrap();
        let inner = ScriptedClient::new(["first", "second"]);
        let client = CachedClient::new(inner.clone(), ResponseCache::new(dir.path().into()));

        client.complete(&request("hi", false)).await.unwrap();
        assert_eq!(client.complete(&request("hi", false)).await.unwrap(), "second");
        assert_eq!(inner.requests().len(), 2);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().into()).with_length(2);
        for key in ["a", "b", "c"] {
            cache.put(key, key).unwrap();
            let file = fs::File::options()
                .write(true)
                .open(dir.path().join(key))
                .unwrap();
            let stamp = match key {
                "a" => 10,
                "b" => 20,
                _ => 30,
            };
            file.set_modified(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(stamp))
                .unwrap();
        }
        cache.evict().unwrap();
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("c").as_deref(), Some("c"));
    }

    #[test]
    fn key_depends_on_sampling_parameters() {
        let mut other = request("hi", true);
        other.params.temperature = 0.7;
        assert_ne!(
            ResponseCache::key(&request("hi", true)).unwrap(),
            ResponseCache::key(&other).unwrap()
        );
    }
}
