//! Arena-backed scene graph with synchronous structural events.
//!
//! Every mutating call finishes its mutation first, then dispatches events to
//! the listeners it concerns before returning. Listeners receive `&SceneGraph`
//! and may query it freely; the graph never holds an internal borrow while a
//! listener runs.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashSet;

use crate::component::{Component, ComponentKind, downcast, same_component};
use crate::error::SceneError;
use crate::layout::Layout;
use crate::provider::Provider;
use crate::signal::Subscription;

/// Index of a node inside its [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A structural change in the graph.
#[derive(Clone, Debug)]
pub enum SceneEvent {
    /// `node` (and its subtree) was attached under `parent`.
    NodeAdded { node: NodeId, parent: NodeId },
    /// `node` (and its subtree) was detached from `parent`.
    NodeRemoved { node: NodeId, parent: NodeId },
    /// `component` was attached to `node`.
    ComponentAdded {
        node: NodeId,
        component: Rc<dyn Component>,
    },
    /// `component` was detached from `node`.
    ComponentRemoved {
        node: NodeId,
        component: Rc<dyn Component>,
    },
}

type StructureCallback = dyn FnMut(&SceneGraph, &SceneEvent);
type LayoutCallback = dyn FnMut(&SceneGraph, NodeId);

struct Listener<F: ?Sized> {
    id: u64,
    scope: NodeId,
    active: Rc<Cell<bool>>,
    callback: Rc<RefCell<F>>,
}

/// Listeners keyed by the node they are scoped to.
struct ListenerTable<F: ?Sized> {
    entries: Rc<RefCell<Vec<Listener<F>>>>,
    next_id: Cell<u64>,
}

impl<F: ?Sized + 'static> ListenerTable<F> {
    fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    fn insert(&self, scope: NodeId, callback: Rc<RefCell<F>>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let active = Rc::new(Cell::new(true));
        self.entries.borrow_mut().push(Listener {
            id,
            scope,
            active: Rc::clone(&active),
            callback,
        });

        let entries: Weak<RefCell<Vec<Listener<F>>>> = Rc::downgrade(&self.entries);
        Subscription::new(move || {
            active.set(false);
            if let Some(entries) = entries.upgrade() {
                entries.borrow_mut().retain(|listener| listener.id != id);
            }
        })
    }

    /// Listeners whose scope satisfies `filter`, snapshotted so the table is
    /// free while they run.
    fn matching(&self, filter: impl Fn(NodeId) -> bool) -> Vec<(Rc<Cell<bool>>, Rc<RefCell<F>>)> {
        self.entries
            .borrow()
            .iter()
            .filter(|listener| filter(listener.scope))
            .map(|listener| (Rc::clone(&listener.active), Rc::clone(&listener.callback)))
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

struct NodeData {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    layout: Layout,
    components: Vec<Rc<dyn Component>>,
    data: Rc<Provider>,
}

/// The scene graph.
pub struct SceneGraph {
    weak_self: Weak<SceneGraph>,
    nodes: RefCell<Vec<NodeData>>,
    structure_listeners: ListenerTable<StructureCallback>,
    layout_listeners: ListenerTable<LayoutCallback>,
}

impl fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.nodes.borrow().len())
            .field("structure_listeners", &self.structure_listeners.len())
            .field("layout_listeners", &self.layout_listeners.len())
            .finish()
    }
}

impl SceneGraph {
    /// Create an empty graph.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            nodes: RefCell::new(Vec::new()),
            structure_listeners: ListenerTable::new(),
            layout_listeners: ListenerTable::new(),
        })
    }

    /// A weak handle to this graph, for components that outlive a callback.
    pub fn downgrade(&self) -> Weak<SceneGraph> {
        self.weak_self.clone()
    }

    /// Create a detached node with the default layout and an empty provider.
    pub fn create_node(&self, name: impl Into<String>) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len() as u32);
        nodes.push(NodeData {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            layout: Layout::DEFAULT,
            components: Vec::new(),
            data: Provider::new(),
        });
        id
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.nodes.borrow().len()
    }

    fn check(&self, node: NodeId) -> Result<(), SceneError> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(node))
        }
    }

    pub fn name(&self, node: NodeId) -> Option<String> {
        self.nodes.borrow().get(node.index()).map(|n| n.name.clone())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.index()).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Topmost ancestor of `node` (the node itself when detached).
    pub fn root(&self, node: NodeId) -> NodeId {
        let nodes = self.nodes.borrow();
        let mut current = node;
        while let Some(parent) = nodes.get(current.index()).and_then(|n| n.parent) {
            current = parent;
        }
        current
    }

    /// Whether `a` and `b` belong to the same tree.
    pub fn same_tree(&self, a: NodeId, b: NodeId) -> bool {
        self.root(a) == self.root(b)
    }

    /// Descendants of `node` in pre-order, optionally starting with `node`.
    pub fn descendants(&self, node: NodeId, include_self: bool) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        if node.index() >= nodes.len() {
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current != node || include_self {
                out.push(current);
            }
            stack.extend(nodes[current.index()].children.iter().rev().copied());
        }
        out
    }

    pub fn layout(&self, node: NodeId) -> Layout {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|n| n.layout)
            .unwrap_or_default()
    }

    /// The node's own data provider.
    pub fn data(&self, node: NodeId) -> Option<Rc<Provider>> {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|n| Rc::clone(&n.data))
    }

    pub fn components(&self, node: NodeId) -> Vec<Rc<dyn Component>> {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|n| n.components.clone())
            .unwrap_or_default()
    }

    pub fn has_component_kind(&self, node: NodeId, kind: ComponentKind) -> bool {
        self.nodes
            .borrow()
            .get(node.index())
            .is_some_and(|n| n.components.iter().any(|c| c.kind() == kind))
    }

    /// First component of `node` with the given kind and concrete type.
    pub fn component<T: Component>(&self, node: NodeId, kind: ComponentKind) -> Option<Rc<T>> {
        self.components(node)
            .iter()
            .filter(|c| c.kind() == kind)
            .find_map(downcast::<T>)
    }

    /// Every component of the given kind and concrete type on `node`.
    pub fn components_of<T: Component>(&self, node: NodeId, kind: ComponentKind) -> Vec<Rc<T>> {
        self.components(node)
            .iter()
            .filter(|c| c.kind() == kind)
            .filter_map(downcast::<T>)
            .collect()
    }

    /// Attach the detached node `child` under `parent`.
    pub fn add_child(&self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check(parent)?;
        self.check(child)?;
        if self.parent(child).is_some() {
            return Err(SceneError::AlreadyParented(child));
        }
        if self.root(parent) == child {
            return Err(SceneError::WouldCycle { parent, child });
        }

        {
            let mut nodes = self.nodes.borrow_mut();
            nodes[child.index()].parent = Some(parent);
            nodes[parent.index()].children.push(child);
        }
        tracing::trace!(%parent, %child, "node added");

        let tree: FxHashSet<NodeId> = self.descendants(self.root(parent), true).into_iter().collect();
        self.dispatch_structure(
            &SceneEvent::NodeAdded {
                node: child,
                parent,
            },
            |scope| tree.contains(&scope),
        );
        Ok(())
    }

    /// Detach `child` (and its subtree) from `parent`.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.check(parent)?;
        self.check(child)?;
        if self.parent(child) != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }

        {
            let mut nodes = self.nodes.borrow_mut();
            nodes[child.index()].parent = None;
            nodes[parent.index()].children.retain(|&c| c != child);
        }
        tracing::trace!(%parent, %child, "node removed");

        let mut touched: FxHashSet<NodeId> = self.descendants(self.root(parent), true).into_iter().collect();
        touched.extend(self.descendants(child, true));
        self.dispatch_structure(
            &SceneEvent::NodeRemoved {
                node: child,
                parent,
            },
            |scope| touched.contains(&scope),
        );
        Ok(())
    }

    /// Attach `component` to `node`.
    pub fn add_component(&self, node: NodeId, component: Rc<dyn Component>) -> Result<(), SceneError> {
        self.check(node)?;
        self.nodes.borrow_mut()[node.index()]
            .components
            .push(Rc::clone(&component));

        component.target_added(self, node);

        let tree: FxHashSet<NodeId> = self.descendants(self.root(node), true).into_iter().collect();
        self.dispatch_structure(
            &SceneEvent::ComponentAdded { node, component },
            |scope| tree.contains(&scope),
        );
        Ok(())
    }

    /// Detach `component` from `node`.
    pub fn remove_component(&self, node: NodeId, component: &Rc<dyn Component>) -> Result<(), SceneError> {
        self.check(node)?;
        let removed = {
            let mut nodes = self.nodes.borrow_mut();
            let components = &mut nodes[node.index()].components;
            let position = components
                .iter()
                .position(|c| same_component(c, component))
                .ok_or(SceneError::ComponentNotFound(node))?;
            components.remove(position)
        };

        removed.target_removed(self, node);

        let tree: FxHashSet<NodeId> = self.descendants(self.root(node), true).into_iter().collect();
        self.dispatch_structure(
            &SceneEvent::ComponentRemoved {
                node,
                component: removed,
            },
            |scope| tree.contains(&scope),
        );
        Ok(())
    }

    /// Replace the layout of `node`, notifying its layout listeners on change.
    pub fn set_layout(&self, node: NodeId, layout: Layout) -> Result<(), SceneError> {
        self.check(node)?;
        let previous = std::mem::replace(&mut self.nodes.borrow_mut()[node.index()].layout, layout);
        if previous == layout {
            return Ok(());
        }

        for (active, callback) in self.layout_listeners.matching(|scope| scope == node) {
            if !active.get() {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(self, node),
                Err(_) => tracing::warn!(%node, "skipping re-entrant layout listener"),
            }
        }
        Ok(())
    }

    /// Listen to structural events of the tree containing `target`.
    ///
    /// A removal is delivered both to the tree that lost the subtree and to the
    /// detached subtree itself.
    pub fn on_structure_changed(
        &self,
        target: NodeId,
        callback: impl FnMut(&SceneGraph, &SceneEvent) + 'static,
    ) -> Subscription {
        let callback: Rc<RefCell<StructureCallback>> = Rc::new(RefCell::new(callback));
        self.structure_listeners.insert(target, callback)
    }

    /// Listen to layout changes of `node` only.
    pub fn on_layout_changed(
        &self,
        node: NodeId,
        callback: impl FnMut(&SceneGraph, NodeId) + 'static,
    ) -> Subscription {
        let callback: Rc<RefCell<LayoutCallback>> = Rc::new(RefCell::new(callback));
        self.layout_listeners.insert(node, callback)
    }

    fn dispatch_structure(&self, event: &SceneEvent, filter: impl Fn(NodeId) -> bool) {
        for (active, callback) in self.structure_listeners.matching(filter) {
            if !active.get() {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(self, event),
                Err(_) => tracing::warn!(?event, "skipping re-entrant structure listener"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Renderer, Surface};

    fn record(graph: &SceneGraph, target: NodeId) -> (Rc<RefCell<Vec<String>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let sub = graph.on_structure_changed(target, move |_, event| {
            let entry = match event {
                SceneEvent::NodeAdded { node, .. } => format!("added {node}"),
                SceneEvent::NodeRemoved { node, .. } => format!("removed {node}"),
                SceneEvent::ComponentAdded { component, .. } => format!("component+ {:?}", component.kind()),
                SceneEvent::ComponentRemoved { component, .. } => format!("component- {:?}", component.kind()),
            };
            l.borrow_mut().push(entry);
        });
        (log, sub)
    }

    #[test]
    fn test_descendants_are_preorder() {
        let graph = SceneGraph::new();
        let root = graph.create_node("root");
        let a = graph.create_node("a");
        let b = graph.create_node("b");
        let a1 = graph.create_node("a1");
        graph.add_child(root, a).unwrap();
        graph.add_child(root, b).unwrap();
        graph.add_child(a, a1).unwrap();

        assert_eq!(graph.descendants(root, true), vec![root, a, a1, b]);
        assert_eq!(graph.descendants(root, false), vec![a, a1, b]);
        assert_eq!(graph.root(a1), root);
    }

    #[test]
    fn test_structural_errors() {
        let graph = SceneGraph::new();
        let root = graph.create_node("root");
        let child = graph.create_node("child");
        graph.add_child(root, child).unwrap();

        assert!(matches!(graph.add_child(root, child), Err(SceneError::AlreadyParented(_))));
        assert!(matches!(graph.add_child(child, root), Err(SceneError::WouldCycle { .. })));
        assert!(matches!(graph.remove_child(child, root), Err(SceneError::NotAChild { .. })));
        let ghost = NodeId(99);
        assert!(matches!(graph.add_child(root, ghost), Err(SceneError::UnknownNode(_))));
    }

    #[test]
    fn test_events_reach_listeners_in_the_same_tree() {
        let graph = SceneGraph::new();
        let root = graph.create_node("root");
        let other = graph.create_node("other-root");
        let child = graph.create_node("child");

        let (in_tree, _a) = record(&graph, root);
        let (elsewhere, _b) = record(&graph, other);

        graph.add_child(root, child).unwrap();
        graph.remove_child(root, child).unwrap();

        assert_eq!(*in_tree.borrow(), vec![format!("added {child}"), format!("removed {child}")]);
        assert!(elsewhere.borrow().is_empty());
    }

    #[test]
    fn test_removal_reaches_detached_subtree() {
        let graph = SceneGraph::new();
        let root = graph.create_node("root");
        let child = graph.create_node("child");
        let grandchild = graph.create_node("grandchild");
        graph.add_child(root, child).unwrap();
        graph.add_child(child, grandchild).unwrap();

        let (log, _sub) = record(&graph, grandchild);
        graph.remove_child(root, child).unwrap();

        assert_eq!(*log.borrow(), vec![format!("removed {child}")]);
    }

    #[test]
    fn test_component_lifecycle_and_events() {
        let graph = SceneGraph::new();
        let root = graph.create_node("root");
        let (log, _sub) = record(&graph, root);

        let surface = Surface::new("hull", "ship.geometry");
        let component: Rc<dyn Component> = surface.clone();
        graph.add_component(root, Rc::clone(&component)).unwrap();
        assert_eq!(surface.target(), Some(root));
        assert!(graph.has_component_kind(root, ComponentKind::Surface));
        assert!(graph.component::<Surface>(root, ComponentKind::Surface).is_some());

        graph.remove_component(root, &component).unwrap();
        assert_eq!(surface.target(), None);
        assert!(matches!(
            graph.remove_component(root, &component),
            Err(SceneError::ComponentNotFound(_))
        ));

        assert_eq!(*log.borrow(), vec!["component+ Surface", "component- Surface"]);
    }

    #[test]
    fn test_layout_listener_fires_on_change_only() {
        let graph = SceneGraph::new();
        let node = graph.create_node("node");
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = graph.on_layout_changed(node, move |graph, node| {
            assert_eq!(graph.layout(node), Layout::HIDDEN);
            h.set(h.get() + 1);
        });

        graph.set_layout(node, Layout::HIDDEN).unwrap();
        graph.set_layout(node, Layout::HIDDEN).unwrap();
        drop(sub);
        graph.set_layout(node, Layout::DEFAULT).unwrap();

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_may_query_graph_during_dispatch() {
        let graph = SceneGraph::new();
        let root = graph.create_node("root");
        let camera = graph.create_node("camera");
        let seen = Rc::new(Cell::new(false));
        let s = Rc::clone(&seen);
        let _sub = graph.on_structure_changed(root, move |graph, event| {
            if let SceneEvent::NodeAdded { node, .. } = event {
                s.set(graph.component::<Renderer>(*node, ComponentKind::Renderer).is_some());
            }
        });

        graph.add_component(camera, Renderer::new()).unwrap();
        graph.add_child(root, camera).unwrap();

        assert!(seen.get());
    }
}
