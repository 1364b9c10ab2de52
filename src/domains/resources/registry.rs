//! Resource Directory - ordered, immutable table of readable resources.
//!
//! Resources are registered once at startup. Lookups are exact-key matches
//! on the URI.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::Resource;
use serde_json::Value;
use tracing::debug;

use super::definitions::{
    ResourceDescriptor, SampleDataResource, SystemInfoResource,
};
use super::error::ResourceError;
use crate::backends::RelationalStore;
use crate::core::config::Config;
use crate::core::error::{Error, Result};

#[derive(Debug, Default)]
pub struct ResourceDirectoryBuilder {
    resources: Vec<ResourceDescriptor>,
    index: HashMap<String, usize>,
}

impl ResourceDirectoryBuilder {
    /// Add a resource. A URI that is already registered is a startup error.
    pub fn register(&mut self, descriptor: ResourceDescriptor) -> Result<&mut Self> {
        if self.index.contains_key(&descriptor.uri) {
            return Err(Error::DuplicateResource(descriptor.uri));
        }
        debug!("Registered resource '{}'", descriptor.uri);
        self.index.insert(descriptor.uri.clone(), self.resources.len());
        self.resources.push(descriptor);
        Ok(self)
    }

    pub fn build(self) -> ResourceDirectory {
        ResourceDirectory {
            resources: self.resources,
            index: self.index,
        }
    }
}

/// Readable resources, in registration order.
#[derive(Debug)]
pub struct ResourceDirectory {
    resources: Vec<ResourceDescriptor>,
    index: HashMap<String, usize>,
}

impl ResourceDirectory {
    pub fn builder() -> ResourceDirectoryBuilder {
        ResourceDirectoryBuilder::default()
    }

    pub fn list(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    /// All resources as rmcp models.
    pub fn to_resources(&self) -> Vec<Resource> {
        self.resources.iter().map(|r| r.to_resource()).collect()
    }

    pub fn get(&self, uri: &str) -> Option<&ResourceDescriptor> {
        self.index.get(uri).map(|&i| &self.resources[i])
    }

    /// Produce the JSON document behind `uri`.
    pub async fn read(&self, uri: &str) -> std::result::Result<Value, ResourceError> {
        let descriptor = self.get(uri).ok_or_else(|| ResourceError::unknown(uri))?;
        descriptor.producer.produce().await
    }

    /// The document rendered as pretty-printed JSON text.
    pub async fn read_text(&self, uri: &str) -> std::result::Result<String, ResourceError> {
        let document = self.read(uri).await?;
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

/// Build the directory of built-in resources.
pub fn build_directory(
    config: &Config,
    tool_count: usize,
    store: Arc<dyn RelationalStore>,
) -> Result<ResourceDirectory> {
    let mut builder = ResourceDirectory::builder();
    builder
        .register(
            SystemInfoResource::new(
                config.server.name.clone(),
                config.server.version.clone(),
                tool_count,
                store,
            )
            .descriptor(),
        )?
        .register(SampleDataResource::descriptor())?;
    Ok(builder.build())
}
