//! Canonical container structures submitted to the runtime

pub mod config;

pub use config::{
    ContainerConfig, EmptyObject, EndpointSettings, HealthConfig, HostConfig, NetworkingConfig,
    PortBinding, RestartPolicy,
};
