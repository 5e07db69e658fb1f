//! Process-wide cache of lazily loaded model backends.
//!
//! Every heavy backend is reached through a [`LazyModel`], which resolves its
//! handle from a [`ModelCache`] slot keyed by [`ModelKey`]. A slot is
//! initialised at most once: the first caller runs the loader, concurrent
//! callers wait on the same slot, later callers reuse the handle. A failed
//! load leaves the slot empty so the next call retries.

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use rag_eval_core::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::sync::OnceCell;

/// Identity of a loaded model, e.g. `embedding:all-mpnet-base-v2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelKey(String);

impl ModelKey {
    pub fn new(role: &str, model_id: &str) -> Self {
        Self(format!("{}:{}", role, model_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Slot = Arc<OnceCell<Arc<dyn Any + Send + Sync>>>;

static GLOBAL_CACHE: OnceLock<Arc<ModelCache>> = OnceLock::new();

#[derive(Default)]
pub struct ModelCache {
    slots: DashMap<ModelKey, Slot>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every [`LazyModel`] that was not given its own.
    pub fn global() -> Arc<ModelCache> {
        GLOBAL_CACHE
            .get_or_init(|| Arc::new(ModelCache::new()))
            .clone()
    }

    /// Returns the cached value for `key`, running `load` if no value is
    /// cached yet.
    pub async fn get_or_load<T, F, Fut>(&self, key: &ModelKey, load: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let slot: Slot = self.slots.entry(key.clone()).or_default().clone();

        let handle = slot
            .get_or_try_init(|| async {
                let started = Instant::now();
                tracing::info!(model = %key, "Loading model");

                match load().await {
                    Ok(value) => {
                        tracing::info!(
                            model = %key,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Model loaded"
                        );
                        Ok(Arc::new(value) as Arc<dyn Any + Send + Sync>)
                    }
                    Err(e) => {
                        tracing::warn!(model = %key, error = %e, "Model load failed");
                        Err(e)
                    }
                }
            })
            .await?;

        (**handle).downcast_ref::<T>().cloned().ok_or_else(|| {
            EvalError::Computation(format!("model cache entry {} holds a different type", key))
        })
    }

    pub fn is_loaded(&self, key: &ModelKey) -> bool {
        self.slots
            .get(key)
            .map(|slot| slot.initialized())
            .unwrap_or(false)
    }

    /// Drops a cached handle so the next access loads it again.
    pub fn evict(&self, key: &ModelKey) -> bool {
        self.slots.remove(key).is_some()
    }

    /// Number of loaded models.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCache")
            .field("loaded", &self.len())
            .finish()
    }
}

pub type ModelLoader<B> = Arc<dyn Fn() -> BoxFuture<'static, Result<Arc<B>>> + Send + Sync>;

/// A backend handle resolved on first use through a [`ModelCache`].
pub struct LazyModel<B: ?Sized> {
    key: ModelKey,
    loader: ModelLoader<B>,
    cache: Arc<ModelCache>,
}

impl<B: ?Sized + Send + Sync + 'static> LazyModel<B> {
    pub fn new<F, Fut>(key: ModelKey, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<B>>> + Send + 'static,
    {
        Self {
            key,
            loader: Arc::new(move || loader().boxed()),
            cache: ModelCache::global(),
        }
    }

    /// Wraps an already constructed backend.
    pub fn ready(key: ModelKey, backend: Arc<B>) -> Self {
        Self::new(key, move || {
            let backend = backend.clone();
            async move { Ok::<_, EvalError>(backend) }
        })
    }

    /// A model that was never configured; every access fails with
    /// `ModelUnavailable`.
    pub fn unconfigured(key: ModelKey) -> Self {
        let model = key.to_string();
        Self::new(key, move || {
            let model = model.clone();
            async move {
                Err::<Arc<B>, _>(EvalError::model_unavailable(model, "no backend configured"))
            }
        })
    }

    pub fn with_cache(mut self, cache: Arc<ModelCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn key(&self) -> &ModelKey {
        &self.key
    }

    pub async fn get(&self) -> Result<Arc<B>> {
        let loader = self.loader.clone();
        self.cache
            .get_or_load::<Arc<B>, _, _>(&self.key, move || loader())
            .await
    }
}

impl<B: ?Sized> Clone for LazyModel<B> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            loader: self.loader.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<B: ?Sized> fmt::Debug for LazyModel<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyModel").field("key", &self.key).finish()
    }
}
