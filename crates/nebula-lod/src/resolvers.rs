//! Lookup functions binding a scheduler to its scene collaborators.
//!
//! Resolvers are plain function values. They receive the scheduler's target
//! node and return the collaborator to bind, or `None` to clear the binding.

use std::fmt;
use std::rc::Rc;

use nebula_scene::{ComponentKind, NodeId, Renderer, SceneGraph, SceneManager};

use crate::master::MasterLodScheduler;

/// A collaborator lookup.
pub type Resolver<T> = Rc<dyn Fn(&SceneGraph, NodeId) -> Option<Rc<T>>>;

/// The three lookups a scheduler runs on every structural change.
#[derive(Clone)]
pub struct Resolvers {
    pub scene_manager: Resolver<SceneManager>,
    pub renderer: Resolver<Renderer>,
    pub master: Resolver<MasterLodScheduler>,
}

impl Default for Resolvers {
    fn default() -> Self {
        Self {
            scene_manager: Rc::new(default_scene_manager),
            renderer: Rc::new(default_renderer),
            master: Rc::new(default_master),
        }
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers").finish_non_exhaustive()
    }
}

/// The scene manager on the root of `node`'s tree.
pub fn default_scene_manager(graph: &SceneGraph, node: NodeId) -> Option<Rc<SceneManager>> {
    graph.component(graph.root(node), ComponentKind::SceneManager)
}

/// The first renderer found walking the tree of `node` in pre-order from its root.
pub fn default_renderer(graph: &SceneGraph, node: NodeId) -> Option<Rc<Renderer>> {
    graph
        .descendants(graph.root(node), true)
        .into_iter()
        .find_map(|descendant| graph.component(descendant, ComponentKind::Renderer))
}

/// The master scheduler on the root of `node`'s tree.
pub fn default_master(graph: &SceneGraph, node: NodeId) -> Option<Rc<MasterLodScheduler>> {
    graph.component(graph.root(node), ComponentKind::MasterLodScheduler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_look_at_the_root() {
        let graph = SceneGraph::new();
        let root = graph.create_node("root");
        let child = graph.create_node("child");
        graph.add_child(root, child).unwrap();

        assert!(default_scene_manager(&graph, child).is_none());
        graph.add_component(child, SceneManager::new()).unwrap();
        assert!(default_scene_manager(&graph, child).is_none());

        let manager = SceneManager::new();
        graph.add_component(root, manager.clone()).unwrap();
        let found = default_scene_manager(&graph, child).unwrap();
        assert!(Rc::ptr_eq(&found, &manager));

        assert!(default_master(&graph, child).is_none());
        let master = MasterLodScheduler::new();
        graph.add_component(root, master.clone()).unwrap();
        assert!(Rc::ptr_eq(&default_master(&graph, child).unwrap(), &master));
    }

    #[test]
    fn test_default_renderer_is_first_in_preorder() {
        let graph = SceneGraph::new();
        let root = graph.create_node("root");
        let a = graph.create_node("a");
        let a1 = graph.create_node("a1");
        let b = graph.create_node("b");
        graph.add_child(root, a).unwrap();
        graph.add_child(a, a1).unwrap();
        graph.add_child(root, b).unwrap();

        let deep = Renderer::new();
        let shallow = Renderer::new();
        graph.add_component(b, shallow).unwrap();
        graph.add_component(a1, deep.clone()).unwrap();

        let found = default_renderer(&graph, b).unwrap();
        assert!(Rc::ptr_eq(&found, &deep));
    }
}
