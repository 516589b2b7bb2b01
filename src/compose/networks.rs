//! Service network attachment

use super::config::NetworksConfig;
use crate::container::EndpointSettings;
use indexmap::IndexMap;

/// Resolve a service's `networks:` field into endpoint settings.
///
/// Per-network options in the mapping form are accepted but not applied.
pub fn resolve_networks(networks: Option<&NetworksConfig>) -> IndexMap<String, EndpointSettings> {
    let names: Vec<&String> = match networks {
        None => Vec::new(),
        Some(NetworksConfig::Array(arr)) => arr.iter().collect(),
        Some(NetworksConfig::Map(map)) => map.keys().collect(),
    };

    names
        .into_iter()
        .map(|name| (name.clone(), EndpointSettings {}))
        .collect()
}

/// Network names referenced by a service
pub fn network_names(networks: Option<&NetworksConfig>) -> Vec<String> {
    resolve_networks(networks).into_keys().collect()
}
