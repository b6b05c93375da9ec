//! Components attached to scene nodes.
//!
//! Dispatch on component type goes through [`Component::kind`], a single
//! capability query, instead of a chain of downcasts. [`downcast`] recovers the
//! concrete type once the kind is known.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::graph::{NodeId, SceneGraph};
use crate::layout::Layout;
use crate::signal::Signal;

/// What a component is, as far as the engine's subsystems care.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Owns the frame loop of a scene.
    SceneManager,
    /// Renders the scene from the camera on its target node.
    Renderer,
    /// A renderable geometry/material pair.
    Surface,
    /// Coordinator shared by the LOD schedulers of a scene.
    MasterLodScheduler,
    /// A per-policy LOD scheduler.
    LodScheduler,
    /// Anything else.
    Other,
}

/// A component that can be attached to a scene node.
pub trait Component: Any {
    /// The capability tag used for dispatch.
    fn kind(&self) -> ComponentKind;

    /// Upcast for [`downcast`].
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// Called by the graph right after the component is attached to `node`.
    fn target_added(&self, _graph: &SceneGraph, _node: NodeId) {}

    /// Called by the graph right after the component is detached from `node`.
    fn target_removed(&self, _graph: &SceneGraph, _node: NodeId) {}
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Recover the concrete type of a component.
pub fn downcast<T: Component>(component: &Rc<dyn Component>) -> Option<Rc<T>> {
    Rc::clone(component).into_any().downcast::<T>().ok()
}

/// Identity comparison for type-erased components.
pub fn same_component(a: &Rc<dyn Component>, b: &Rc<dyn Component>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Time information delivered at the start of every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTick {
    /// Seconds since the scene manager started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta_time: f32,
}

/// Drives the frame loop of the scene it is attached to.
///
/// Its target node's data provider holds scene-wide properties such as
/// `viewport`.
#[derive(Debug, Default)]
pub struct SceneManager {
    target: Cell<Option<NodeId>>,
    time: Cell<f32>,
    frame_id: Cell<u64>,
    frame_begin: Signal<FrameTick>,
}

impl SceneManager {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// Signal fired at the beginning of every frame.
    pub fn frame_begin(&self) -> &Signal<FrameTick> {
        &self.frame_begin
    }

    /// Advance the clock by `delta_time` seconds and announce the new frame.
    pub fn next_frame(&self, delta_time: f32) {
        let time = self.time.get() + delta_time;
        self.time.set(time);
        self.frame_id.set(self.frame_id.get() + 1);
        self.frame_begin.emit(&FrameTick { time, delta_time });
    }

    pub fn time(&self) -> f32 {
        self.time.get()
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id.get()
    }
}

impl Component for SceneManager {
    fn kind(&self) -> ComponentKind {
        ComponentKind::SceneManager
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

/// Renders from the camera on its target node.
///
/// The camera publishes `worldToScreenMatrix`, `viewMatrix`, `eyePosition`,
/// `fov`, `aspectRatio`, `zNear` and `zFar` on the target node's provider.
#[derive(Debug, Default)]
pub struct Renderer {
    target: Cell<Option<NodeId>>,
}

impl Renderer {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }
}

impl Component for Renderer {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Renderer
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

/// Process-unique identifier of a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A renderable surface referencing a streamable resource by key.
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    name: String,
    resource: String,
    layout_mask: Cell<Layout>,
    target: Cell<Option<NodeId>>,
    layout_mask_changed: Signal<SurfaceId>,
}

impl Surface {
    /// Create a surface named `name` that draws the resource keyed `resource`.
    pub fn new(name: impl Into<String>, resource: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            id: SurfaceId::next(),
            name: name.into(),
            resource: resource.into(),
            layout_mask: Cell::new(Layout::all()),
            target: Cell::new(None),
            layout_mask_changed: Signal::new(),
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the resource (geometry) drawn by this surface.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    pub fn layout_mask(&self) -> Layout {
        self.layout_mask.get()
    }

    /// Change the layout mask, notifying listeners if it differs.
    pub fn set_layout_mask(&self, mask: Layout) {
        if self.layout_mask.replace(mask) != mask {
            self.layout_mask_changed.emit(&self.id);
        }
    }

    /// Signal fired after the layout mask changes.
    pub fn layout_mask_changed(&self) -> &Signal<SurfaceId> {
        &self.layout_mask_changed
    }
}

impl Component for Surface {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Surface
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
    use std::cell::RefCell;

    #[test]
    fn test_downcast_by_kind() {
        let surface: Rc<dyn Component> = Surface::new("hull", "ship.geometry");
        assert_eq!(surface.kind(), ComponentKind::Surface);
        assert!(downcast::<Surface>(&surface).is_some());
        assert!(downcast::<Renderer>(&surface).is_none());
    }

    #[test]
    fn test_scene_manager_ticks_accumulate_time() {
        let manager = SceneManager::new();
        let ticks = Rc::new(RefCell::new(Vec::new()));
        let t = Rc::clone(&ticks);
        let _sub = manager.frame_begin().connect(move |tick| t.borrow_mut().push(*tick));

        manager.next_frame(0.5);
        manager.next_frame(0.25);

        assert_eq!(manager.frame_id(), 2);
        assert_eq!(ticks.borrow()[1].time, 0.75);
        assert_eq!(ticks.borrow()[1].delta_time, 0.25);
    }

    #[test]
    fn test_surface_mask_change_notifies_once() {
        let surface = Surface::new("hull", "ship.geometry");
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = surface.layout_mask_changed().connect(move |_| h.set(h.get() + 1));

        surface.set_layout_mask(Layout::DEFAULT);
        surface.set_layout_mask(Layout::DEFAULT);

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_surface_ids_are_unique() {
        assert_ne!(Surface::new("a", "r").id(), Surface::new("b", "r").id());
    }

    #[test]
    fn test_same_component_is_identity() {
        let a: Rc<dyn Component> = Renderer::new();
        let b: Rc<dyn Component> = Renderer::new();
        assert!(same_component(&a, &Rc::clone(&a)));
        assert!(!same_component(&a, &b));
    }
}
