//! Fluent API for describing the proxy task.

use proxystack_common::constants;
use proxystack_common::env::ProxyEnvironment;
use proxystack_common::error::{Result, TopologyError};
use proxystack_common::types::{EntityId, Protocol};

use crate::entity::{ContainerSpec, PortMapping, TaskSpecification};

/// Builder for a single-container [`TaskSpecification`].
#[derive(Debug)]
pub struct TaskSpecBuilder {
    container_name: String,
    image: Option<String>,
    environment: ProxyEnvironment,
    container_port: Option<u16>,
    logging: Option<EntityId>,
}

impl TaskSpecBuilder {
    /// Creates a builder for a container named `container_name`.
    #[must_use]
    pub fn new(container_name: impl Into<String>) -> Self {
        Self {
            container_name: container_name.into(),
            image: None,
            environment: ProxyEnvironment::default(),
            container_port: None,
            logging: None,
        }
    }

    /// Sets the image reference.
    #[must_use]
    pub fn image(mut self, reference: impl Into<String>) -> Self {
        self.image = Some(reference.into());
        self
    }

    /// Sets the resolved environment.
    #[must_use]
    pub fn environment(mut self, environment: ProxyEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the TCP port the container listens on.
    #[must_use]
    pub const fn container_port(mut self, port: u16) -> Self {
        self.container_port = Some(port);
        self
    }

    /// Routes the container's output to a declared log sink.
    #[must_use]
    pub fn logging(mut self, sink: EntityId) -> Self {
        self.logging = Some(sink);
        self
    }

    /// Builds the immutable task descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the image or port is missing, or the container
    /// name is empty.
    pub fn build(self) -> Result<TaskSpecification> {
        if self.container_name.is_empty() {
            return Err(TopologyError::Config {
                message: "container name is required".to_string(),
            });
        }
        let image = self.image.ok_or_else(|| TopologyError::Config {
            message: "image reference is required".to_string(),
        })?;
        let port = self.container_port.ok_or_else(|| TopologyError::Config {
            message: "container port is required".to_string(),
        })?;
        if port == 0 {
            return Err(TopologyError::constraint("container port must be non-zero"));
        }

        Ok(TaskSpecification {
            container: ContainerSpec {
                name: self.container_name,
                image,
                environment: self.environment,
                port_mapping: PortMapping {
                    container_port: port,
                    host_port: port,
                    protocol: Protocol::Tcp,
                },
                logging: self.logging,
            },
        })
    }
}

impl Default for TaskSpecBuilder {
    fn default() -> Self {
        Self::new(constants::CONTAINER_NAME)
            .image(constants::DEFAULT_IMAGE)
            .container_port(constants::PROXY_PORT)
    }
}
