//! Drill-down table for one dashboard slice.
//!
//! Each load fetches the full instance list, filters it, then resolves the
//! master address of every distinct cluster in the result. Lookups run
//! concurrently; a failed or slow lookup only blanks that cluster's link.
//! Every load takes a sequence number, and a load that is no longer the
//! latest one stops enriching and never replaces the committed page.

use alba_backend::{BackendError, ClusterBackend};
use alba_common::filter::distinct_cluster_keys;
use alba_common::palette::status_color;
use alba_common::{ClusterKey, ClusterLink, DetailFilter, Instance};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterLink {
    pub label: String,
    pub url: String,
}

impl From<&ClusterLink> for MasterLink {
    fn from(link: &ClusterLink) -> Self {
        Self {
            label: link.label().to_string(),
            url: link.service_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailRow {
    #[serde(flatten)]
    pub instance: Instance,
    pub cluster_key: ClusterKey,
    pub status_color: &'static str,
    pub master: Option<MasterLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailPage {
    pub title: String,
    pub filter: DetailFilter,
    pub href: String,
    /// Sequence number of the load that produced this page.
    pub load: u64,
    pub rows: Vec<DetailRow>,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Ready(Arc<DetailPage>),
    /// A newer load started before this one finished.
    Superseded,
}

pub struct DetailView {
    backend: Arc<dyn ClusterBackend>,
    generation: AtomicU64,
    lookup_timeout: Duration,
    current: RwLock<Option<Arc<DetailPage>>>,
}

impl DetailView {
    pub fn new(backend: Arc<dyn ClusterBackend>, lookup_timeout: Duration) -> Self {
        Self {
            backend,
            generation: AtomicU64::new(0),
            lookup_timeout,
            current: RwLock::new(None),
        }
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, load: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == load
    }

    /// Abandons in-flight loads and forgets the committed page.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut current) = self.current.write() {
            *current = None;
        }
    }

    /// Last committed page.
    pub fn current(&self) -> Option<Arc<DetailPage>> {
        self.current.read().ok().and_then(|page| page.clone())
    }

    pub async fn load(
        &self,
        filter: DetailFilter,
        token: Option<&str>,
    ) -> Result<LoadOutcome, BackendError> {
        let load = self.begin();
        let instances = self.backend.list_instances(token).await?;
        if !self.is_current(load) {
            return Ok(LoadOutcome::Superseded);
        }

        let matched = filter.apply(&instances);
        let Some(links) = self.resolve_links(&matched, token, load).await else {
            tracing::debug!("detail load {} superseded during enrichment", load);
            return Ok(LoadOutcome::Superseded);
        };

        let rows = matched
            .into_iter()
            .map(|instance| {
                let cluster_key = ClusterKey::of(&instance);
                DetailRow {
                    master: links.get(cluster_key.as_str()).map(MasterLink::from),
                    status_color: status_color(&instance.status),
                    cluster_key,
                    instance,
                }
            })
            .collect();

        let page = Arc::new(DetailPage {
            title: filter.title(),
            href: filter.href(),
            filter,
            load,
            rows,
        });

        {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !self.is_current(load) {
                return Ok(LoadOutcome::Superseded);
            }
            *current = Some(page.clone());
        }
        Ok(LoadOutcome::Ready(page))
    }

    /// `None` once the load is superseded; pending lookups are dropped.
    async fn resolve_links(
        &self,
        instances: &[Instance],
        token: Option<&str>,
        load: u64,
    ) -> Option<HashMap<String, ClusterLink>> {
        let mut lookups: FuturesUnordered<_> = distinct_cluster_keys(instances)
            .into_iter()
            .map(|id| async move {
                let result =
                    tokio::time::timeout(self.lookup_timeout, self.backend.get_cluster(token, &id))
                        .await;
                (id, result)
            })
            .collect();

        let mut links = HashMap::new();
        while let Some((id, result)) = lookups.next().await {
            if !self.is_current(load) {
                return None;
            }
            match result {
                Ok(Ok(cluster)) => {
                    if let Some(link) = ClusterLink::from_cluster(&cluster) {
                        links.insert(id, link);
                    }
                }
                Ok(Err(e)) => tracing::debug!("cluster {} lookup failed: {}", id, e),
                Err(_) => tracing::debug!("cluster {} lookup timed out", id),
            }
        }
        Some(links)
    }
}
