use crate::cloud::ResourceHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedResource {
    pub name: String,
    pub handle: ResourceHandle,
}

/// Resources created during one orchestration run, in creation order.
///
/// Owned by the run; rollback drains it back to front.
#[derive(Debug, Clone, Default)]
pub struct CreatedResources {
    entries: Vec<CreatedResource>,
}

impl CreatedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful create. Recording a name again only refreshes its
    /// handle; the original position is kept.
    pub fn record(&mut self, name: impl Into<String>, handle: ResourceHandle) {
        let name = name.into();
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(existing) => existing.handle = handle,
            None => self.entries.push(CreatedResource { name, handle }),
        }
    }

    pub fn handle(&self, name: &str) -> Option<&ResourceHandle> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.handle)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handle(name).is_some()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &CreatedResource> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether provisioning got past its first step.
    pub fn has_provisioned_anything(&self) -> bool {
        !self.is_empty()
    }

    /// Removes every entry and returns them newest first.
    pub fn drain_newest_first(&mut self) -> Vec<CreatedResource> {
        let mut drained: Vec<_> = self.entries.drain(..).collect();
        drained.reverse();
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{ResourceId, ResourceKind};

    fn handle(name: &str) -> ResourceHandle {
        ResourceHandle::new(ResourceId::resource_group("sub", name))
    }

    #[test]
    fn keeps_creation_order_and_drains_in_reverse() {
        let mut registry = CreatedResources::new();
        registry.record("a", handle("a"));
        registry.record("b", handle("b"));
        registry.record("c", handle("c"));
        assert_eq!(registry.names(), ["a", "b", "c"]);

        let drained: Vec<_> = registry
            .drain_newest_first()
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(drained, ["c", "b", "a"]);
        assert!(registry.is_empty());
        assert!(!registry.has_provisioned_anything());
    }

    #[test]
    fn recording_twice_keeps_position() {
        let mut registry = CreatedResources::new();
        registry.record("a", handle("a"));
        registry.record("b", handle("b"));
        let ns = ResourceId::resource_group("sub", "a")
            .child(ResourceKind::Namespace, "ns")
            .unwrap();
        registry.record("a", ResourceHandle::new(ns));

        assert_eq!(registry.names(), ["a", "b"]);
        assert_eq!(registry.handle("a").unwrap().kind(), ResourceKind::Namespace);
    }
}
