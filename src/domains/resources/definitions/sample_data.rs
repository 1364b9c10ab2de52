//! Static sample data resource.

use std::sync::Arc;

use serde_json::{Value, json};

use super::{ResourceDescriptor, ResourceProducer};
use crate::domains::resources::error::ResourceError;

pub struct SampleDataResource;

impl SampleDataResource {
    pub const URI: &'static str = "example://sample-data";
    pub const NAME: &'static str = "Sample Data";
    pub const DESCRIPTION: &'static str = "Static sample items for testing clients";

    pub fn descriptor() -> ResourceDescriptor {
        ResourceDescriptor::json(Self::URI, Self::NAME, Self::DESCRIPTION, Arc::new(Self))
    }
}

#[async_trait::async_trait]
impl ResourceProducer for SampleDataResource {
    async fn produce(&self) -> Result<Value, ResourceError> {
        Ok(json!({
            "items": [
                {"id": 1, "name": "Item 1", "value": 100},
                {"id": 2, "name": "Item 2", "value": 200},
                {"id": 3, "name": "Item 3", "value": 300}
            ],
            "total": 600,
            "count": 3
        }))
    }
}
