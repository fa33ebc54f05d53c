// Chart colors. Only determinism matters here: a key always maps to the same
// color, and different keys may collide.

use crate::{ClusterKey, InstanceStatus, Provider};

pub const UNKNOWN_COLOR: &str = "#999999";

const PROVIDER_COLORS: [&str; 3] = ["#63eaf1", "#63a8f1", "#6366f1"];

pub fn status_color(status: &InstanceStatus) -> &'static str {
    match status {
        InstanceStatus::Pending => "#f1de63",
        InstanceStatus::Running => "#63f1b1",
        InstanceStatus::Stopped => "#bdbcb5",
        InstanceStatus::Terminated => "#f1a063",
        InstanceStatus::Error => "#f16363",
        InstanceStatus::Other(_) => UNKNOWN_COLOR,
    }
}

pub fn provider_color(provider: &Provider) -> String {
    match Provider::ALL.iter().position(|p| p == provider) {
        Some(index) => PROVIDER_COLORS[index % PROVIDER_COLORS.len()].to_string(),
        None => hsl_for(provider.as_str()),
    }
}

pub fn cluster_color(key: &ClusterKey) -> String {
    hsl_for(key.as_str())
}

/// 31-polynomial hash over UTF-16 code units, wrapping at 32 bits.
pub fn hue_of(key: &str) -> u32 {
    let hash = key
        .encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)));
    hash % 360
}

fn hsl_for(key: &str) -> String {
    format!("hsl({}, 80%, 80%)", hue_of(key))
}
