use crate::error::Result;
use crate::resolver::Resolver;
use crate::resource::{Resource, ResourceId, ResourceKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// A [`Resolver`] that remembers what it has resolved.
///
/// Resolving an identifier that was resolved before returns the same [`Resource`] handle
/// without a request. Only identifiers not yet seen are fetched, still in batches. Nothing is
/// ever evicted; call [`CachedResolver::clear`] to start over.
#[derive(Debug, Clone)]
pub struct CachedResolver {
    inner: Resolver,
    resources: Arc<Mutex<HashMap<ResourceId, Resource>>>,
}

impl CachedResolver {
    pub fn new(inner: Resolver) -> Self {
        Self {
            inner,
            resources: Arc::default(),
        }
    }

    /// Like [`Resolver::resolve`], but skips identifiers already in the cache.
    #[instrument(skip(self, ids), fields(n = ids.len()))]
    pub async fn resolve<S: AsRef<str>>(
        &self,
        kind: ResourceKind,
        ids: &[S],
    ) -> Result<Vec<Resource>> {
        let ids = ids
            .iter()
            .map(|id| ResourceId::new(kind, id.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut resources = self.resources.lock().await;
        let uncached: Vec<&str> = ids
            .iter()
            .filter(|id| !resources.contains_key(*id))
            .map(ResourceId::id)
            .collect();

        if !uncached.is_empty() {
            tracing::debug!(
                cached = ids.len() - uncached.len(),
                fetching = uncached.len(),
                "resolving uncached ids"
            );
            for resource in self.inner.resolve(kind, &uncached).await? {
                resources.insert(resource.id().clone(), resource);
            }
        }

        Ok(ids
            .iter()
            .map(|id| match resources.get(id) {
                Some(resource) => resource.clone(),
                // every uncached id was inserted above
                None => self.inner.lazy(id.clone()),
            })
            .collect())
    }

    /// A cached resource, or a fresh lazy one that is remembered from now on.
    pub async fn get(&self, id: ResourceId) -> Resource {
        self.resources
            .lock()
            .await
            .entry(id)
            .or_insert_with_key(|id| self.inner.lazy(id.clone()))
            .clone()
    }

    /// Number of remembered resources.
    pub async fn len(&self) -> usize {
        self.resources.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.resources.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.resources.lock().await.clear();
    }

    pub fn resolver(&self) -> &Resolver {
        &self.inner
    }
}
