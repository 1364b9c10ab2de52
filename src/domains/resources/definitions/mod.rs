//! Resource definitions module.
//!
//! Each resource lives in its own file and implements [`ResourceProducer`].
//!
//! ## Adding a New Resource
//!
//! 1. Create a new file (e.g., `my_resource.rs`)
//! 2. Implement `ResourceProducer` and give it a `descriptor()`
//! 3. Export it here
//! 4. Register it in `build_directory`

mod sample_data;
mod system_info;

use std::sync::Arc;

use rmcp::model::{AnnotateAble, RawResource, Resource};
use serde_json::Value;

use super::error::ResourceError;

pub use sample_data::SampleDataResource;
pub use system_info::SystemInfoResource;

/// Produces the JSON document behind a resource URI.
#[async_trait::async_trait]
pub trait ResourceProducer: Send + Sync {
    async fn produce(&self) -> Result<Value, ResourceError>;
}

/// A listed resource and its producer.
#[derive(Clone)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub producer: Arc<dyn ResourceProducer>,
}

impl ResourceDescriptor {
    pub fn json(
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        producer: Arc<dyn ResourceProducer>,
    ) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: description.into(),
            mime_type: "application/json".to_string(),
            producer,
        }
    }

    /// The rmcp resource model for `resources/list`.
    pub fn to_resource(&self) -> Resource {
        let mut raw = RawResource::new(self.uri.clone(), self.name.clone());
        raw.description = Some(self.description.clone());
        raw.mime_type = Some(self.mime_type.clone());
        raw.no_annotation()
    }
}

impl std::fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("uri", &self.uri)
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}
