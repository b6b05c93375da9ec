//! The LOD scheduler component.
//!
//! A [`LodScheduler`] attached to a node watches the surfaces of that node's
//! tree, tracks the resources its policy registers, and once per frame
//! recomputes the requirements that were invalidated. Structural events are
//! handled synchronously; the surfaces they touch are queued and only handed
//! to the policy during the next update.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use glam::Vec4;
use nebula_config::SchedulerConfig;
use nebula_scene::{
    Component, ComponentKind, FrameTick, Layout, NodeId, Provider, Renderer, SceneEvent, SceneGraph,
    SceneManager, Subscription, Surface, SurfaceId, downcast,
};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::master::MasterLodScheduler;
use crate::policy::LodPolicy;
use crate::properties;
use crate::registry::{ResourceInfo, ResourceRegistry};
use crate::resolvers::Resolvers;
use crate::surfaces::{self, SurfaceWatchList};
use crate::view::{ViewParams, ViewTracker};

/// Hook calls that may arrive while the policy is already running.
#[derive(Debug)]
enum Notification {
    MaxAvailableLod { uuid: Uuid, max_available_lod: i32 },
    Viewport(Vec4),
    View(ViewParams),
}

struct SceneManagerBinding {
    manager: Weak<SceneManager>,
    _frame_begin: Subscription,
    _root_data_changed: Subscription,
}

struct RendererBinding {
    renderer: Weak<Renderer>,
    _view_changed: Subscription,
}

#[derive(Default)]
struct Bindings {
    scene_manager: Option<SceneManagerBinding>,
    renderer: Option<RendererBinding>,
    master: Option<Weak<MasterLodScheduler>>,
}

struct Attachment {
    graph: Weak<SceneGraph>,
    target: NodeId,
    _structure_changed: Subscription,
    layouts: FxHashMap<NodeId, Subscription>,
}

/// Per-frame LOD requirement scheduler, driven by a [`LodPolicy`].
pub struct LodScheduler {
    weak_self: Weak<LodScheduler>,
    policy: RefCell<Box<dyn LodPolicy>>,
    resources: RefCell<ResourceRegistry>,
    surfaces: RefCell<SurfaceWatchList>,
    view: Cell<ViewTracker>,
    bindings: RefCell<Bindings>,
    resolvers: RefCell<Resolvers>,
    attachment: RefCell<Option<Attachment>>,
    notifications: RefCell<VecDeque<Notification>>,
    enabled: Cell<bool>,
    layout_mask: Cell<Layout>,
    frame_time: Cell<f32>,
    updating: Cell<bool>,
}

impl fmt::Debug for LodScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LodScheduler")
            .field("target", &self.target())
            .field("enabled", &self.enabled.get())
            .field("layout_mask", &self.layout_mask.get())
            .field("frame_time", &self.frame_time.get())
            .field("resources", &self.resource_count())
            .field("pending_additions", &self.pending_additions())
            .field("pending_removals", &self.pending_removals())
            .finish_non_exhaustive()
    }
}

impl LodScheduler {
    /// Create a detached, enabled scheduler considering every layout.
    pub fn new(policy: impl LodPolicy + 'static) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            policy: RefCell::new(Box::new(policy)),
            resources: RefCell::new(ResourceRegistry::default()),
            surfaces: RefCell::new(SurfaceWatchList::default()),
            view: Cell::new(ViewTracker::default()),
            bindings: RefCell::new(Bindings::default()),
            resolvers: RefCell::new(Resolvers::default()),
            attachment: RefCell::new(None),
            notifications: RefCell::new(VecDeque::new()),
            enabled: Cell::new(true),
            layout_mask: Cell::new(Layout::all()),
            frame_time: Cell::new(0.0),
            updating: Cell::new(false),
        })
    }

    pub fn from_config(policy: impl LodPolicy + 'static, config: &SchedulerConfig) -> Rc<Self> {
        let scheduler = Self::new(policy);
        scheduler.enabled.set(config.enabled);
        scheduler.layout_mask.set(Layout::from_raw(config.layout_mask));
        scheduler
    }

    // --- Resources ---

    /// Start tracking `data`. Registering an already tracked provider returns
    /// its current state and changes nothing.
    pub fn register(&self, data: &Rc<Provider>) -> ResourceInfo {
        let weak_self = self.weak_self.clone();
        let weak_data = Rc::downgrade(data);
        let mut resources = self.resources.borrow_mut();
        let (info, created) = resources.register(data, move |data| {
            data.property_changed().connect(move |change| {
                if change.name != properties::MAX_AVAILABLE_LOD {
                    return;
                }
                let (Some(scheduler), Some(data)) = (weak_self.upgrade(), weak_data.upgrade()) else {
                    return;
                };
                if let Some(max_available_lod) = data.get::<i32>(properties::MAX_AVAILABLE_LOD) {
                    scheduler.notify(Notification::MaxAvailableLod {
                        uuid: change.provider,
                        max_available_lod,
                    });
                }
            })
        });
        if created {
            tracing::debug!(uuid = %info.uuid(), "resource registered");
        }
        info.clone()
    }

    /// Stop tracking a resource. Returns `false` if it was not registered.
    pub fn unregister(&self, uuid: &Uuid) -> bool {
        let removed = self.resources.borrow_mut().unregister(uuid);
        if removed.is_some() {
            tracing::debug!(%uuid, "resource unregistered");
        }
        removed.is_some()
    }

    /// Mark one resource for recomputation on the next update.
    pub fn invalidate(&self, uuid: &Uuid) -> bool {
        self.resources.borrow_mut().invalidate(uuid)
    }

    /// Mark every resource for recomputation on the next update.
    pub fn invalidate_all(&self) {
        self.resources.borrow_mut().invalidate_all();
    }

    /// Invalidate every resource and update right away, at the time of the
    /// last frame. Runs even when the scheduler is disabled.
    pub fn force_update(&self) {
        self.invalidate_all();
        self.update(self.frame_time.get());
    }

    pub fn resource(&self, uuid: &Uuid) -> Option<ResourceInfo> {
        self.resources.borrow().get(uuid).cloned()
    }

    pub fn is_registered(&self, uuid: &Uuid) -> bool {
        self.resources.borrow().contains(uuid)
    }

    pub fn resource_count(&self) -> usize {
        self.resources.borrow().len()
    }

    pub fn resource_uuids(&self) -> Vec<Uuid> {
        self.resources.borrow().uuids()
    }

    // --- Settings ---

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enable or disable the per-frame update. Frame times are recorded either way.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn layout_mask(&self) -> Layout {
        self.layout_mask.get()
    }

    /// Change the layouts considered, re-evaluating every watched surface.
    pub fn set_layout_mask(&self, mask: Layout) {
        if self.layout_mask.replace(mask) == mask {
            return;
        }
        let Some(graph) = self.graph() else {
            return;
        };
        let watched = self.surfaces.borrow().watched();
        for surface in &watched {
            self.surface_layout_invalidated(&graph, surface);
        }
    }

    pub fn resolvers(&self) -> Resolvers {
        self.resolvers.borrow().clone()
    }

    /// Replace every resolver and rebind.
    pub fn set_resolvers(&self, resolvers: Resolvers) {
        *self.resolvers.borrow_mut() = resolvers;
        if let Some(graph) = self.graph() {
            self.resolve_bindings(&graph);
        }
    }

    pub fn set_scene_manager_resolver(
        &self,
        resolver: impl Fn(&SceneGraph, NodeId) -> Option<Rc<SceneManager>> + 'static,
    ) {
        self.resolvers.borrow_mut().scene_manager = Rc::new(resolver);
        if let Some(graph) = self.graph() {
            self.resolve_scene_manager(&graph);
        }
    }

    pub fn set_renderer_resolver(&self, resolver: impl Fn(&SceneGraph, NodeId) -> Option<Rc<Renderer>> + 'static) {
        self.resolvers.borrow_mut().renderer = Rc::new(resolver);
        if let Some(graph) = self.graph() {
            self.resolve_renderer(&graph);
        }
    }

    pub fn set_master_resolver(
        &self,
        resolver: impl Fn(&SceneGraph, NodeId) -> Option<Rc<MasterLodScheduler>> + 'static,
    ) {
        self.resolvers.borrow_mut().master = Rc::new(resolver);
        if let Some(graph) = self.graph() {
            self.resolve_master(&graph);
        }
    }

    // --- Introspection ---

    /// The node this scheduler is attached to.
    pub fn target(&self) -> Option<NodeId> {
        self.attachment.borrow().as_ref().map(|attachment| attachment.target)
    }

    pub fn scene_manager(&self) -> Option<Rc<SceneManager>> {
        self.bindings
            .borrow()
            .scene_manager
            .as_ref()
            .and_then(|binding| binding.manager.upgrade())
    }

    pub fn renderer(&self) -> Option<Rc<Renderer>> {
        self.bindings
            .borrow()
            .renderer
            .as_ref()
            .and_then(|binding| binding.renderer.upgrade())
    }

    pub fn master(&self) -> Option<Rc<MasterLodScheduler>> {
        self.bindings.borrow().master.as_ref().and_then(Weak::upgrade)
    }

    /// Time of the last frame seen, whether or not it triggered an update.
    pub fn frame_time(&self) -> f32 {
        self.frame_time.get()
    }

    pub fn viewport(&self) -> Option<Vec4> {
        self.view.get().viewport
    }

    pub fn view(&self) -> Option<ViewParams> {
        self.view.get().view
    }

    pub fn is_watching(&self, surface: SurfaceId) -> bool {
        self.surfaces.borrow().is_watching(surface)
    }

    pub fn watched_surfaces(&self) -> Vec<Rc<Surface>> {
        self.surfaces.borrow().watched()
    }

    pub fn pending_additions(&self) -> usize {
        self.surfaces.borrow().pending_additions()
    }

    pub fn pending_removals(&self) -> usize {
        self.surfaces.borrow().pending_removals()
    }

    pub fn is_pending_addition(&self, surface: SurfaceId) -> bool {
        self.surfaces.borrow().is_pending_addition(surface)
    }

    pub fn is_pending_removal(&self, surface: SurfaceId) -> bool {
        self.surfaces.borrow().is_pending_removal(surface)
    }

    /// Whether `surface` passes this scheduler's layout mask. Surfaces that are
    /// not attached, or belong to no live graph, are not visible.
    pub fn is_visible(&self, surface: &Surface) -> bool {
        self.graph()
            .is_some_and(|graph| self.surface_is_visible(&graph, surface))
    }

    // --- Update loop ---

    fn frame_begin(&self, tick: &FrameTick) {
        self.frame_time.set(tick.time);
        if !self.enabled.get() {
            return;
        }
        self.update(tick.time);
    }

    /// Ignored while an update or any policy hook is running, before any
    /// queue or dirty flag is touched.
    fn update(&self, time: f32) {
        if self.updating.get() || self.policy.try_borrow_mut().is_err() {
            tracing::warn!("nested lod update ignored");
            return;
        }
        self.updating.set(true);
        self.collect_surfaces();
        self.recompute(time);
        self.updating.set(false);
    }

    /// Hand pending removals, then pending additions, to the policy.
    /// Additions wait until a master scheduler is bound.
    fn collect_surfaces(&self) {
        loop {
            let Some(surface) = self.surfaces.borrow_mut().pop_removed() else {
                break;
            };
            tracing::debug!(surface = surface.name(), "surface removed");
            if self.with_policy(|policy| policy.on_surface_removed(self, &surface)).is_none() {
                self.surfaces.borrow_mut().enqueue_remove(&surface);
                return;
            }
        }

        if self.master().is_none() {
            return;
        }

        loop {
            let Some(surface) = self.surfaces.borrow_mut().pop_added() else {
                break;
            };
            tracing::debug!(surface = surface.name(), "surface added");
            if self.with_policy(|policy| policy.on_surface_added(self, &surface)).is_none() {
                self.surfaces.borrow_mut().enqueue_add(&surface);
                return;
            }
        }
    }

    fn recompute(&self, time: f32) {
        let invalid = self.resources.borrow_mut().take_invalid();
        for resource in invalid {
            let uuid = resource.uuid();
            if !self.is_registered(&uuid) {
                continue;
            }
            let Some(lod_info) = self.with_policy(|policy| policy.compute_lod_info(self, &resource, time)) else {
                self.invalidate(&uuid);
                continue;
            };

            let previous = resource.lod_info();
            tracing::trace!(%uuid, ?previous, ?lod_info, "lod requirement computed");
            if previous == lod_info {
                continue;
            }
            if !self.resources.borrow_mut().store_lod_info(&uuid, lod_info) {
                continue;
            }

            let resource = resource.with_lod_info(lod_info);
            self.with_policy(|policy| policy.on_lod_info_changed(self, &resource, previous, lod_info));
        }
    }

    // --- Policy dispatch ---

    /// Run `f` on the policy, then deliver notifications queued meanwhile.
    fn with_policy<R>(&self, f: impl FnOnce(&mut dyn LodPolicy) -> R) -> Option<R> {
        let result = match self.policy.try_borrow_mut() {
            Ok(mut policy) => Some(f(&mut **policy)),
            Err(_) => {
                tracing::warn!("lod policy re-entered, hook skipped");
                None
            }
        };
        self.flush_notifications();
        result
    }

    fn notify(&self, notification: Notification) {
        self.notifications.borrow_mut().push_back(notification);
        self.flush_notifications();
    }

    /// Deliver queued notifications unless the policy is busy. The call that
    /// holds the policy flushes once it is done.
    fn flush_notifications(&self) {
        loop {
            let Ok(mut policy) = self.policy.try_borrow_mut() else {
                return;
            };
            let Some(notification) = self.notifications.borrow_mut().pop_front() else {
                return;
            };
            match notification {
                Notification::MaxAvailableLod {
                    uuid,
                    max_available_lod,
                } => {
                    if let Some(resource) = self.resource(&uuid) {
                        policy.on_max_available_lod_changed(self, &resource, max_available_lod);
                    }
                }
                Notification::Viewport(viewport) => policy.on_viewport_changed(self, viewport),
                Notification::View(view) => policy.on_view_changed(self, &view),
            }
        }
    }

    fn viewport_changed(&self, viewport: Vec4) {
        let mut view = self.view.get();
        view.viewport = Some(viewport);
        self.view.set(view);
        self.notify(Notification::Viewport(viewport));
    }

    fn view_changed(&self, params: ViewParams) {
        let mut view = self.view.get();
        view.view = Some(params);
        self.view.set(view);
        self.notify(Notification::View(params));
    }

    fn clear_viewport(&self) {
        let mut view = self.view.get();
        view.viewport = None;
        self.view.set(view);
    }

    fn clear_view(&self) {
        let mut view = self.view.get();
        view.view = None;
        self.view.set(view);
    }

    // --- Hierarchy binding ---

    fn graph(&self) -> Option<Rc<SceneGraph>> {
        self.attachment
            .borrow()
            .as_ref()
            .and_then(|attachment| attachment.graph.upgrade())
    }

    fn attach(&self, graph: &SceneGraph, target: NodeId) {
        if self.attachment.borrow().is_some() {
            self.detach();
        }

        let weak_self = self.weak_self.clone();
        let structure_changed = graph.on_structure_changed(target, move |graph, event| {
            if let Some(scheduler) = weak_self.upgrade() {
                scheduler.structure_changed(graph, event);
            }
        });
        *self.attachment.borrow_mut() = Some(Attachment {
            graph: graph.downgrade(),
            target,
            _structure_changed: structure_changed,
            layouts: FxHashMap::default(),
        });
        tracing::debug!(node = %target, "lod scheduler attached");

        self.node_added(graph, target);
    }

    /// Release every subscription and binding; watched surfaces are queued
    /// for removal.
    fn detach(&self) {
        let Some(attachment) = self.attachment.borrow_mut().take() else {
            return;
        };
        let target = attachment.target;
        drop(attachment);

        *self.bindings.borrow_mut() = Bindings::default();
        self.view.set(ViewTracker::default());

        let mut surfaces = self.surfaces.borrow_mut();
        let watched = surfaces.unwatch_all();
        for surface in &watched {
            surfaces.enqueue_remove(surface);
        }
        tracing::debug!(node = %target, surfaces = watched.len(), "lod scheduler detached");
    }

    fn structure_changed(&self, graph: &SceneGraph, event: &SceneEvent) {
        match event {
            SceneEvent::NodeAdded { node, .. } => self.node_added(graph, *node),
            SceneEvent::NodeRemoved { .. } => self.node_removed(graph),
            SceneEvent::ComponentAdded { component, .. } => match component.kind() {
                ComponentKind::SceneManager => self.resolve_scene_manager(graph),
                ComponentKind::Renderer => self.resolve_renderer(graph),
                ComponentKind::MasterLodScheduler => self.resolve_master(graph),
                ComponentKind::Surface => {
                    if let Some(surface) = downcast::<Surface>(component) {
                        self.watch_surface(graph, &surface);
                        if self.surface_is_visible(graph, &surface) {
                            self.surfaces.borrow_mut().enqueue_add(&surface);
                        }
                    }
                }
                ComponentKind::LodScheduler | ComponentKind::Other => {}
            },
            SceneEvent::ComponentRemoved { component, .. } => match component.kind() {
                ComponentKind::SceneManager => self.resolve_scene_manager(graph),
                ComponentKind::Renderer => self.resolve_renderer(graph),
                ComponentKind::MasterLodScheduler => self.resolve_master(graph),
                ComponentKind::Surface => {
                    if let Some(surface) = downcast::<Surface>(component) {
                        let mut surfaces = self.surfaces.borrow_mut();
                        surfaces.unwatch(surface.id());
                        surfaces.enqueue_remove(&surface);
                    }
                }
                ComponentKind::LodScheduler | ComponentKind::Other => {}
            },
        }
    }

    fn node_added(&self, graph: &SceneGraph, node: NodeId) {
        self.resolve_bindings(graph);

        let subtree = graph.descendants(node, true);
        self.watch_layouts(graph, &subtree);
        for descendant in subtree {
            for surface in graph.components_of::<Surface>(descendant, ComponentKind::Surface) {
                self.watch_surface(graph, &surface);
                self.surfaces.borrow_mut().enqueue_add(&surface);
            }
        }
    }

    /// Rebind, then let go of every node and surface that is no longer in the
    /// target's tree.
    fn node_removed(&self, graph: &SceneGraph) {
        self.resolve_bindings(graph);
        let Some(target) = self.target() else {
            return;
        };

        if let Some(attachment) = self.attachment.borrow_mut().as_mut() {
            attachment.layouts.retain(|&node, _| graph.same_tree(node, target));
        }

        let watched = self.surfaces.borrow().watched();
        let mut surfaces = self.surfaces.borrow_mut();
        for surface in watched {
            let in_tree = surface.target().is_some_and(|node| graph.same_tree(node, target));
            if !in_tree {
                surfaces.unwatch(surface.id());
                surfaces.enqueue_remove(&surface);
            }
        }
    }

    fn watch_layouts(&self, graph: &SceneGraph, nodes: &[NodeId]) {
        let mut attachment = self.attachment.borrow_mut();
        let Some(attachment) = attachment.as_mut() else {
            return;
        };
        for &node in nodes {
            if attachment.layouts.contains_key(&node) {
                continue;
            }
            let weak_self = self.weak_self.clone();
            let subscription = graph.on_layout_changed(node, move |graph, node| {
                if let Some(scheduler) = weak_self.upgrade() {
                    scheduler.node_layout_changed(graph, node);
                }
            });
            attachment.layouts.insert(node, subscription);
        }
    }

    fn node_layout_changed(&self, graph: &SceneGraph, node: NodeId) {
        for surface in graph.components_of::<Surface>(node, ComponentKind::Surface) {
            if self.is_watching(surface.id()) {
                self.surface_layout_invalidated(graph, &surface);
            }
        }
    }

    fn watch_surface(&self, graph: &SceneGraph, surface: &Rc<Surface>) {
        let weak_self = self.weak_self.clone();
        let weak_graph = graph.downgrade();
        let weak_surface = Rc::downgrade(surface);
        self.surfaces.borrow_mut().watch(surface, move |surface| {
            surface.layout_mask_changed().connect(move |_| {
                let (Some(scheduler), Some(graph), Some(surface)) =
                    (weak_self.upgrade(), weak_graph.upgrade(), weak_surface.upgrade())
                else {
                    return;
                };
                scheduler.surface_layout_invalidated(&graph, &surface);
            })
        });
    }

    fn surface_is_visible(&self, graph: &SceneGraph, surface: &Surface) -> bool {
        surface.target().is_some_and(|node| {
            surfaces::is_visible(graph.layout(node), surface.layout_mask(), self.layout_mask.get())
        })
    }

    fn surface_layout_invalidated(&self, graph: &SceneGraph, surface: &Rc<Surface>) {
        let visible = self.surface_is_visible(graph, surface);
        let mut surfaces = self.surfaces.borrow_mut();
        if visible {
            surfaces.enqueue_add(surface);
        } else {
            surfaces.enqueue_remove(surface);
        }
    }

    fn resolve_bindings(&self, graph: &SceneGraph) {
        self.resolve_scene_manager(graph);
        self.resolve_renderer(graph);
        self.resolve_master(graph);
    }

    fn resolve_scene_manager(&self, graph: &SceneGraph) {
        let Some(target) = self.target() else {
            return;
        };
        let resolver = Rc::clone(&self.resolvers.borrow().scene_manager);
        self.bind_scene_manager(graph, resolver(graph, target));
    }

    fn resolve_renderer(&self, graph: &SceneGraph) {
        let Some(target) = self.target() else {
            return;
        };
        let resolver = Rc::clone(&self.resolvers.borrow().renderer);
        self.bind_renderer(graph, resolver(graph, target));
    }

    fn resolve_master(&self, graph: &SceneGraph) {
        let Some(target) = self.target() else {
            return;
        };
        let resolver = Rc::clone(&self.resolvers.borrow().master);
        self.bind_master(resolver(graph, target));
    }

    fn bind_scene_manager(&self, graph: &SceneGraph, manager: Option<Rc<SceneManager>>) {
        if same_binding(self.scene_manager().as_ref(), manager.as_ref()) {
            return;
        }
        self.bindings.borrow_mut().scene_manager = None;
        self.clear_viewport();
        let Some(manager) = manager else {
            tracing::debug!("scene manager unbound");
            return;
        };

        let weak_self = self.weak_self.clone();
        let frame_begin = manager.frame_begin().connect(move |tick| {
            if let Some(scheduler) = weak_self.upgrade() {
                scheduler.frame_begin(tick);
            }
        });

        let root_data = manager.target().and_then(|root| graph.data(root));
        let root_data_changed = match &root_data {
            Some(data) => {
                let weak_self = self.weak_self.clone();
                let weak_data = Rc::downgrade(data);
                data.property_changed().connect(move |change| {
                    if change.name != properties::VIEWPORT {
                        return;
                    }
                    let (Some(scheduler), Some(data)) = (weak_self.upgrade(), weak_data.upgrade()) else {
                        return;
                    };
                    if let Some(viewport) = data.get::<Vec4>(properties::VIEWPORT) {
                        scheduler.viewport_changed(viewport);
                    }
                })
            }
            None => Subscription::empty(),
        };

        self.bindings.borrow_mut().scene_manager = Some(SceneManagerBinding {
            manager: Rc::downgrade(&manager),
            _frame_begin: frame_begin,
            _root_data_changed: root_data_changed,
        });
        tracing::debug!(node = ?manager.target(), "scene manager bound");

        if let Some(viewport) = root_data.and_then(|data| data.get::<Vec4>(properties::VIEWPORT)) {
            self.viewport_changed(viewport);
        }
    }

    fn bind_renderer(&self, graph: &SceneGraph, renderer: Option<Rc<Renderer>>) {
        if same_binding(self.renderer().as_ref(), renderer.as_ref()) {
            return;
        }
        self.bindings.borrow_mut().renderer = None;
        self.clear_view();
        let Some(renderer) = renderer else {
            tracing::debug!("renderer unbound");
            return;
        };

        let camera_data = renderer.target().and_then(|camera| graph.data(camera));
        let view_changed = match &camera_data {
            Some(data) => {
                let weak_self = self.weak_self.clone();
                let weak_data = Rc::downgrade(data);
                data.property_changed().connect(move |change| {
                    if change.name != properties::WORLD_TO_SCREEN_MATRIX {
                        return;
                    }
                    let (Some(scheduler), Some(data)) = (weak_self.upgrade(), weak_data.upgrade()) else {
                        return;
                    };
                    if let Some(view) = ViewParams::from_provider(&data) {
                        scheduler.view_changed(view);
                    }
                })
            }
            None => Subscription::empty(),
        };

        self.bindings.borrow_mut().renderer = Some(RendererBinding {
            renderer: Rc::downgrade(&renderer),
            _view_changed: view_changed,
        });
        tracing::debug!(node = ?renderer.target(), "renderer bound");

        if let Some(view) = camera_data.and_then(|data| ViewParams::from_provider(&data)) {
            self.view_changed(view);
        }
    }

    fn bind_master(&self, master: Option<Rc<MasterLodScheduler>>) {
        if same_binding(self.master().as_ref(), master.as_ref()) {
            return;
        }
        match &master {
            Some(master) => tracing::debug!(node = ?master.target(), "master lod scheduler bound"),
            None => tracing::debug!("master lod scheduler unbound"),
        }
        self.bindings.borrow_mut().master = master.as_ref().map(Rc::downgrade);
    }
}

fn same_binding<T>(current: Option<&Rc<T>>, next: Option<&Rc<T>>) -> bool {
    match (current, next) {
        (Some(current), Some(next)) => Rc::ptr_eq(current, next),
        (None, None) => true,
        _ => false,
    }
}

impl Component for LodScheduler {
    fn kind(&self) -> ComponentKind {
        ComponentKind::LodScheduler
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn target_added(&self, graph: &SceneGraph, node: NodeId) {
        self.attach(graph, node);
    }

    fn target_removed(&self, _graph: &SceneGraph, _node: NodeId) {
        self.detach();
    }
}
