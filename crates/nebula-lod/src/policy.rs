//! The policy strategy plugged into a [`LodScheduler`].
//!
//! A scheduler only orchestrates: it decides *when* a requirement is
//! recomputed and *where* it is written. The policy decides *what* the
//! requirement is, and reacts to surfaces and view changes.

use std::rc::Rc;

use glam::Vec4;
use nebula_scene::Surface;

use crate::lod_info::LodInfo;
use crate::properties;
use crate::registry::ResourceInfo;
use crate::scheduler::LodScheduler;
use crate::view::ViewParams;

/// LOD selection strategy.
///
/// Only [`compute_lod_info`](LodPolicy::compute_lod_info) is required. Every
/// hook receives the scheduler so it can query bindings and (un)register
/// resources; hooks may call back into the scheduler freely, notifications
/// raised while a hook runs are delivered once it returns.
pub trait LodPolicy {
    /// Compute the requirement of a resource whose previous one was invalidated.
    fn compute_lod_info(&mut self, scheduler: &LodScheduler, resource: &ResourceInfo, time: f32) -> LodInfo;

    /// Called when a recomputed requirement differs from the stored one.
    /// `resource` already carries `lod_info`.
    fn on_lod_info_changed(
        &mut self,
        _scheduler: &LodScheduler,
        resource: &ResourceInfo,
        previous: LodInfo,
        lod_info: LodInfo,
    ) {
        write_lod_info(resource, previous, lod_info);
    }

    /// A loader published a new `maxAvailableLod` for a registered resource.
    fn on_max_available_lod_changed(
        &mut self,
        _scheduler: &LodScheduler,
        _resource: &ResourceInfo,
        _max_available_lod: i32,
    ) {
    }

    /// A visible surface was collected while a master scheduler is bound.
    fn on_surface_added(&mut self, _scheduler: &LodScheduler, _surface: &Rc<Surface>) {}

    /// A surface left the scheduler's scope or stopped being visible.
    fn on_surface_removed(&mut self, _scheduler: &LodScheduler, _surface: &Rc<Surface>) {}

    fn on_viewport_changed(&mut self, _scheduler: &LodScheduler, _viewport: Vec4) {}

    fn on_view_changed(&mut self, _scheduler: &LodScheduler, _view: &ViewParams) {}
}

/// Default write-back: store the fields of `lod_info` that differ from
/// `previous` on the resource's provider, one property per field.
pub fn write_lod_info(resource: &ResourceInfo, previous: LodInfo, lod_info: LodInfo) {
    if previous.required_lod != lod_info.required_lod {
        resource.data().set(properties::REQUIRED_LOD, lod_info.required_lod);
    }
    if !previous.same_priority(&lod_info) {
        resource.data().set(properties::PRIORITY, lod_info.priority);
    }
}
