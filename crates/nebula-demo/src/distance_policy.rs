//! A distance-based LOD policy for the demo scene.

use std::rc::Rc;

use glam::Vec3;
use nebula_lod::{LodInfo, LodPolicy, LodScheduler, ResourceInfo, ViewParams};
use nebula_scene::Surface;

/// Property holding a resource's world-space centre (`Vec3`).
pub const BOUNDING_CENTER: &str = "boundingCenter";

/// Picks finer LODs the closer the camera is to a resource.
pub struct DistancePolicy {
    /// Distance under which each successive LOD is required, farthest first.
    lod_distances: Vec<f32>,
    eye: Option<Vec3>,
}

impl DistancePolicy {
    pub fn new(lod_distances: Vec<f32>) -> Self {
        Self {
            lod_distances,
            eye: None,
        }
    }

    fn lod_for(&self, distance: f32) -> i32 {
        self.lod_distances.iter().filter(|&&limit| distance < limit).count() as i32
    }
}

impl LodPolicy for DistancePolicy {
    fn compute_lod_info(&mut self, _scheduler: &LodScheduler, resource: &ResourceInfo, _time: f32) -> LodInfo {
        let Some(eye) = self.eye else {
            return LodInfo::default();
        };
        let center = resource.data().get::<Vec3>(BOUNDING_CENTER).unwrap_or(Vec3::ZERO);
        let distance = eye.distance(center);
        LodInfo::new(self.lod_for(distance), 1.0 / (1.0 + distance))
    }

    fn on_max_available_lod_changed(&mut self, _scheduler: &LodScheduler, resource: &ResourceInfo, max_available_lod: i32) {
        tracing::debug!(
            uuid = %resource.uuid(),
            max_available_lod,
            required_lod = resource.lod_info().required_lod,
            "loader progressed"
        );
    }

    fn on_surface_added(&mut self, scheduler: &LodScheduler, surface: &Rc<Surface>) {
        let Some(master) = scheduler.master() else {
            return;
        };
        let data = master.register_resource(surface.resource());
        scheduler.register(&data);
    }

    fn on_surface_removed(&mut self, scheduler: &LodScheduler, surface: &Rc<Surface>) {
        if let Some(data) = scheduler.master().and_then(|master| master.resource_data(surface.resource())) {
            scheduler.unregister(&data.uuid());
        }
    }

    fn on_view_changed(&mut self, scheduler: &LodScheduler, view: &ViewParams) {
        self.eye = Some(view.eye_position);
        scheduler.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lod_grows_as_distance_shrinks() {
        let policy = DistancePolicy::new(vec![400.0, 150.0, 50.0]);
        assert_eq!(policy.lod_for(1000.0), 0);
        assert_eq!(policy.lod_for(200.0), 1);
        assert_eq!(policy.lod_for(100.0), 2);
        assert_eq!(policy.lod_for(10.0), 3);
    }
}
