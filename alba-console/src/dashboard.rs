//! Dashboard view model: the chart aggregates with a drill-down link on
//! every slice.

use alba_common::aggregate::{ClusterSlice, ProviderSlice, StatusCount};
use alba_common::palette::provider_color;
use alba_common::{DetailFilter, Instance, InstanceCharts, Provider, User};
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Serialize)]
pub struct Linked<T> {
    #[serde(flatten)]
    pub item: T,
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatusChart {
    pub provider: Provider,
    pub color: String,
    pub href: String,
    pub slices: Vec<Linked<StatusCount>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterStatusBar {
    pub cluster_key: String,
    pub label: String,
    pub total: usize,
    pub href: String,
    pub segments: Vec<Linked<StatusCount>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardModel {
    pub user: Option<User>,
    pub total: usize,
    pub clusters: Vec<Linked<ClusterSlice>>,
    pub providers: Vec<Linked<ProviderSlice>>,
    pub provider_status: Vec<ProviderStatusChart>,
    pub cluster_status: Vec<ClusterStatusBar>,
    pub error: Option<String>,
}

impl DashboardModel {
    pub fn build(user: Option<User>, instances: &[Instance]) -> Self {
        Self::from_charts(user, InstanceCharts::build(instances), None)
    }

    /// A failed fetch gives empty charts plus the error text.
    pub fn from_fetch<E: Display>(user: Option<User>, fetched: &Result<Vec<Instance>, E>) -> Self {
        let error = fetched
            .as_ref()
            .err()
            .map(|e| format!("Could not load instances: {}", e));
        Self::from_charts(user, InstanceCharts::from_fetch(fetched), error)
    }

    fn from_charts(user: Option<User>, charts: InstanceCharts, error: Option<String>) -> Self {
        let clusters = charts
            .by_cluster
            .into_iter()
            .map(|slice| Linked {
                href: DetailFilter::cluster(&slice.key).href(),
                item: slice,
            })
            .collect();

        let providers = charts
            .by_provider
            .into_iter()
            .map(|slice| Linked {
                href: DetailFilter::provider(&slice.provider).href(),
                item: slice,
            })
            .collect();

        let provider_status = charts
            .by_provider_status
            .into_iter()
            .map(|(provider, counts)| ProviderStatusChart {
                color: provider_color(&provider),
                href: DetailFilter::provider(&provider).href(),
                slices: counts
                    .into_iter()
                    .map(|count| Linked {
                        href: DetailFilter::provider_status(&provider, &count.status).href(),
                        item: count,
                    })
                    .collect(),
                provider,
            })
            .collect();

        let cluster_status = charts
            .by_cluster_status
            .into_iter()
            .map(|row| ClusterStatusBar {
                href: DetailFilter::cluster(&row.cluster_key).href(),
                total: row.counts.total(),
                segments: row
                    .counts
                    .non_zero()
                    .into_iter()
                    .map(|count| Linked {
                        href: DetailFilter::cluster_status(&row.cluster_key, &count.status).href(),
                        item: count,
                    })
                    .collect(),
                cluster_key: row.cluster_key.as_str().to_string(),
                label: row.label,
            })
            .collect();

        Self {
            user,
            total: charts.total,
            clusters,
            providers,
            provider_status,
            cluster_status,
            error,
        }
    }
}
