use std::collections::HashMap;

use crate::limits::*;
use crate::model::{Resource, ResourceId};

use super::SchedulerError;

/// Registered resources, kept in registration order.
///
/// The scheduler wraps this in its own reader/writer lock; the registry itself
/// is plain data.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    order: Vec<ResourceId>,
    resources: HashMap<ResourceId, Resource>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    /// Insert or replace. A re-registered id keeps its original position.
    pub fn register(&mut self, resource: Resource) -> Result<(), SchedulerError> {
        validate_resource(&resource)?;
        if let Some(existing) = self.resources.get_mut(&resource.id) {
            *existing = resource;
            return Ok(());
        }
        if self.order.len() >= MAX_RESOURCES {
            return Err(SchedulerError::LimitExceeded("too many resources"));
        }
        self.order.push(resource.id.clone());
        self.resources.insert(resource.id.clone(), resource);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Snapshot in registration order.
    pub fn all(&self) -> Vec<Resource> {
        self.order
            .iter()
            .filter_map(|id| self.resources.get(id))
            .cloned()
            .collect()
    }
}

fn validate_resource(resource: &Resource) -> Result<(), SchedulerError> {
    if resource.id.is_empty() {
        return Err(SchedulerError::InvalidResource("empty resource id"));
    }
    if resource.id.len() > MAX_RESOURCE_ID_LEN {
        return Err(SchedulerError::LimitExceeded("resource id too long"));
    }
    if let Some(ref n) = resource.name
        && n.len() > MAX_NAME_LEN
    {
        return Err(SchedulerError::LimitExceeded("resource name too long"));
    }
    Ok(())
}
