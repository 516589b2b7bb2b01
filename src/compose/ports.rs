//! Port declaration normalization
//!
//! The runtime API wants two views of the same declarations: the set of
//! exposed container ports and, per container port, the list of host
//! bindings. Every declared port is TCP. Host and container parts are
//! passed through as written.

use super::config::{PortEntry, ScalarValue};
use crate::config::EntryPolicy;
use crate::container::{EmptyObject, PortBinding};
use crate::error::Result;
use indexmap::IndexMap;

/// Protocol suffix appended to every container port key
pub const PORT_PROTOCOL: &str = "tcp";

/// Normalized port declarations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortBindings {
    /// `<port>/tcp` keys
    pub exposed_ports: IndexMap<String, EmptyObject>,
    /// `<port>/tcp` to host bindings, in declaration order
    pub port_bindings: IndexMap<String, Vec<PortBinding>>,
}

impl PortBindings {
    /// Record one `(host, container)` pair
    fn add(&mut self, host_port: &str, container_port: &str) {
        let key = format!("{}/{}", container_port, PORT_PROTOCOL);
        self.exposed_ports.insert(key.clone(), EmptyObject {});
        self.port_bindings
            .entry(key)
            .or_default()
            .push(PortBinding::new(host_port));
    }

    pub fn is_empty(&self) -> bool {
        self.exposed_ports.is_empty()
    }
}

/// Resolve one declaration into `(host_port, container_port)`
fn resolve(entry: &PortEntry) -> Option<(String, String)> {
    match entry {
        PortEntry::Long(long) => {
            let container = long.target.as_ref().map(|t| t.to_string()).unwrap_or_default();
            let host = long
                .published
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_default();
            Some((host, container))
        }
        PortEntry::Short(ScalarValue::Text(text)) => match text.split_once(':') {
            Some((host, container)) => Some((host.to_string(), container.to_string())),
            None => Some((String::new(), text.clone())),
        },
        PortEntry::Short(ScalarValue::Integer(port)) => Some((String::new(), port.to_string())),
        PortEntry::Short(_) | PortEntry::Other(_) => None,
    }
}

fn describe(entry: &PortEntry) -> String {
    match entry {
        PortEntry::Short(value) => value.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}

/// Normalize a service's `ports:` sequence
pub fn normalize_ports(service: &str, ports: &[PortEntry], policy: EntryPolicy) -> Result<PortBindings> {
    let mut bindings = PortBindings::default();

    for entry in ports {
        match resolve(entry) {
            Some((host, container)) if !container.is_empty() => bindings.add(&host, &container),
            _ => policy.malformed(service, "ports", describe(entry))?,
        }
    }

    Ok(bindings)
}
