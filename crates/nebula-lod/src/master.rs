//! Scene-wide LOD coordinator.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use nebula_scene::{Component, ComponentKind, NodeId, Provider, SceneGraph};
use rustc_hash::FxHashMap;

/// Shares one property group per resource between the schedulers of a scene.
///
/// Resources are keyed by the resource key of the surfaces drawing them. A
/// scheduler without a bound master keeps its surface additions pending.
#[derive(Debug, Default)]
pub struct MasterLodScheduler {
    target: Cell<Option<NodeId>>,
    resources: RefCell<FxHashMap<String, Rc<Provider>>>,
}

impl MasterLodScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// The provider of the resource keyed `key`, created on first use.
    pub fn register_resource(&self, key: &str) -> Rc<Provider> {
        let mut resources = self.resources.borrow_mut();
        if let Some(data) = resources.get(key) {
            return Rc::clone(data);
        }
        let data = Provider::new();
        tracing::debug!(key, uuid = %data.uuid(), "resource registered with master");
        resources.insert(key.to_owned(), Rc::clone(&data));
        data
    }

    /// Forget a resource. Returns its provider if it was registered.
    pub fn unregister_resource(&self, key: &str) -> Option<Rc<Provider>> {
        let removed = self.resources.borrow_mut().remove(key);
        if removed.is_some() {
            tracing::debug!(key, "resource unregistered from master");
        }
        removed
    }

    pub fn resource_data(&self, key: &str) -> Option<Rc<Provider>> {
        self.resources.borrow().get(key).cloned()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.borrow().len()
    }
}

impl Component for MasterLodScheduler {
    fn kind(&self) -> ComponentKind {
        ComponentKind::MasterLodScheduler
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn target_added(&self, _graph: &SceneGraph, node: NodeId) {
        self.target.set(Some(node));
    }

    fn target_removed(&self, _graph: &SceneGraph, _node: NodeId) {
        self.target.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_resource_shares_the_provider() {
        let master = MasterLodScheduler::new();
        let a = master.register_resource("terrain.geometry");
        let b = master.register_resource("terrain.geometry");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(master.resource_count(), 1);
    }

    #[test]
    fn test_unregister_resource() {
        let master = MasterLodScheduler::new();
        let data = master.register_resource("ship.geometry");
        let removed = master.unregister_resource("ship.geometry").unwrap();
        assert!(Rc::ptr_eq(&data, &removed));
        assert!(master.unregister_resource("ship.geometry").is_none());
        assert!(master.resource_data("ship.geometry").is_none());
    }
}
