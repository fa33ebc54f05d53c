//! Instance counts for the dashboard charts.
//!
//! Every function here is pure and independent of input order: groups live in
//! ordered maps keyed by the fixed provider/status enumerations or by
//! [`ClusterKey`], so two permutations of the same snapshot aggregate to the
//! same output.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::palette;
use crate::{ClusterKey, Instance, InstanceStatus, Provider};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSlice {
    pub key: ClusterKey,
    pub label: String,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSlice {
    pub provider: Provider,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: InstanceStatus,
    pub count: usize,
    pub color: &'static str,
}

/// One counter per known status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub stopped: usize,
    pub terminated: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn get(&self, status: &InstanceStatus) -> usize {
        match status {
            InstanceStatus::Pending => self.pending,
            InstanceStatus::Running => self.running,
            InstanceStatus::Stopped => self.stopped,
            InstanceStatus::Terminated => self.terminated,
            InstanceStatus::Error => self.error,
            InstanceStatus::Other(_) => 0,
        }
    }

    /// Returns false for statuses outside the known set.
    pub fn increment(&mut self, status: &InstanceStatus) -> bool {
        let slot = match status {
            InstanceStatus::Pending => &mut self.pending,
            InstanceStatus::Running => &mut self.running,
            InstanceStatus::Stopped => &mut self.stopped,
            InstanceStatus::Terminated => &mut self.terminated,
            InstanceStatus::Error => &mut self.error,
            InstanceStatus::Other(_) => return false,
        };
        *slot += 1;
        true
    }

    pub fn total(&self) -> usize {
        self.pending + self.running + self.stopped + self.terminated + self.error
    }

    /// Non-empty counters in status enumeration order.
    pub fn non_zero(&self) -> Vec<StatusCount> {
        InstanceStatus::ALL
            .iter()
            .map(|status| StatusCount {
                status: status.clone(),
                count: self.get(status),
                color: palette::status_color(status),
            })
            .filter(|entry| entry.count > 0)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterStatusRow {
    pub cluster_key: ClusterKey,
    pub label: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

pub fn aggregate_by_cluster(instances: &[Instance]) -> Vec<ClusterSlice> {
    let mut counts: BTreeMap<ClusterKey, usize> = BTreeMap::new();
    for instance in instances {
        *counts.entry(ClusterKey::of(instance)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(key, count)| ClusterSlice {
            label: key.label(),
            color: palette::cluster_color(&key),
            key,
            count,
        })
        .collect()
}

pub fn aggregate_by_provider(instances: &[Instance]) -> Vec<ProviderSlice> {
    Provider::ALL
        .iter()
        .map(|provider| ProviderSlice {
            provider: provider.clone(),
            count: instances.iter().filter(|i| &i.provider == provider).count(),
            color: palette::provider_color(provider),
        })
        .filter(|slice| slice.count > 0)
        .collect()
}

/// Status breakdown per known provider. Providers without any counted
/// instance are absent, and no entry ever carries a zero count.
pub fn aggregate_by_provider_status(instances: &[Instance]) -> BTreeMap<Provider, Vec<StatusCount>> {
    let mut grid: BTreeMap<Provider, StatusCounts> = BTreeMap::new();
    for instance in instances.iter().filter(|i| i.provider.is_known()) {
        grid.entry(instance.provider.clone())
            .or_default()
            .increment(&instance.status);
    }

    grid.into_iter()
        .map(|(provider, counts)| (provider, counts.non_zero()))
        .filter(|(_, statuses)| !statuses.is_empty())
        .collect()
}

/// One row per cluster key (sentinel included) for the stacked bar chart.
pub fn aggregate_by_cluster_status(instances: &[Instance]) -> Vec<ClusterStatusRow> {
    let mut rows: BTreeMap<ClusterKey, StatusCounts> = BTreeMap::new();
    for instance in instances {
        rows.entry(ClusterKey::of(instance))
            .or_default()
            .increment(&instance.status);
    }

    rows.into_iter()
        .map(|(cluster_key, counts)| ClusterStatusRow {
            label: cluster_key.label(),
            cluster_key,
            counts,
        })
        .collect()
}

/// All dashboard aggregates for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstanceCharts {
    pub total: usize,
    pub by_cluster: Vec<ClusterSlice>,
    pub by_provider: Vec<ProviderSlice>,
    pub by_provider_status: BTreeMap<Provider, Vec<StatusCount>>,
    pub by_cluster_status: Vec<ClusterStatusRow>,
}

impl InstanceCharts {
    pub fn build(instances: &[Instance]) -> Self {
        Self {
            total: instances.len(),
            by_cluster: aggregate_by_cluster(instances),
            by_provider: aggregate_by_provider(instances),
            by_provider_status: aggregate_by_provider_status(instances),
            by_cluster_status: aggregate_by_cluster_status(instances),
        }
    }

    /// A failed fetch aggregates like an empty snapshot.
    pub fn from_fetch<E>(fetched: &Result<Vec<Instance>, E>) -> Self {
        match fetched {
            Ok(instances) => Self::build(instances),
            Err(_) => Self::default(),
        }
    }
}
