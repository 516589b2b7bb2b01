//! Volume declaration normalization
//!
//! Short-syntax entries become `host:container:mode,Z`; `Z` relabels the
//! source for SELinux.

use super::config::VolumeEntry;
use crate::config::EntryPolicy;
use crate::error::Result;

/// Mode used when an entry names none
pub const DEFAULT_BIND_MODE: &str = "rw";

/// Relabel option appended to every bind mode
pub const BIND_LABEL: &str = "Z";

/// Canonical bind string for a single short-syntax entry
fn bind_string(entry: &str) -> Option<String> {
    if !entry.contains(':') {
        return None;
    }
    let parts: Vec<&str> = entry.split(':').collect();
    let host_path = parts[0];
    let container_path = parts[1];
    let mode = parts.get(2).copied().unwrap_or(DEFAULT_BIND_MODE);
    Some(format!(
        "{}:{}:{},{}",
        host_path, container_path, mode, BIND_LABEL
    ))
}

/// Normalize a service's `volumes:` sequence
pub fn normalize_volumes(service: &str, volumes: &[VolumeEntry], policy: EntryPolicy) -> Result<Vec<String>> {
    let mut binds = Vec::with_capacity(volumes.len());

    for entry in volumes {
        match entry {
            VolumeEntry::Short(text) => match bind_string(text) {
                Some(bind) => binds.push(bind),
                None => policy.malformed(service, "volumes", text.as_str())?,
            },
            VolumeEntry::Other(value) => {
                let rendered = serde_yaml::to_string(value)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|_| format!("{:?}", value));
                policy.malformed(service, "volumes", rendered)?;
            }
        }
    }

    Ok(binds)
}
