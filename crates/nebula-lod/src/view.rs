//! Camera and viewport parameters cached for LOD decisions.

use glam::{Mat4, Vec3, Vec4};
use nebula_scene::Provider;

use crate::properties;

/// View/projection parameters published by a renderer's camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewParams {
    pub world_to_screen_matrix: Mat4,
    pub view_matrix: Mat4,
    pub eye_position: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect_ratio: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            world_to_screen_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            eye_position: Vec3::ZERO,
            fov: 0.0,
            aspect_ratio: 0.0,
            z_near: 0.0,
            z_far: 0.0,
        }
    }
}

impl ViewParams {
    /// Read the view from a renderer's provider.
    ///
    /// `worldToScreenMatrix` is mandatory; the other properties fall back to
    /// their defaults when absent.
    pub fn from_provider(data: &Provider) -> Option<Self> {
        let defaults = Self::default();
        Some(Self {
            world_to_screen_matrix: data.get(properties::WORLD_TO_SCREEN_MATRIX)?,
            view_matrix: data.get(properties::VIEW_MATRIX).unwrap_or(defaults.view_matrix),
            eye_position: data.get(properties::EYE_POSITION).unwrap_or(defaults.eye_position),
            fov: data.get(properties::FOV).unwrap_or(defaults.fov),
            aspect_ratio: data.get(properties::ASPECT_RATIO).unwrap_or(defaults.aspect_ratio),
            z_near: data.get(properties::Z_NEAR).unwrap_or(defaults.z_near),
            z_far: data.get(properties::Z_FAR).unwrap_or(defaults.z_far),
        })
    }

    /// Build the parameters of a perspective camera at `eye` looking at `target`.
    pub fn perspective(eye: Vec3, target: Vec3, fov: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        let view_matrix = Mat4::look_at_rh(eye, target, Vec3::Y);
        let projection = Mat4::perspective_rh(fov, aspect_ratio, z_near, z_far);
        Self {
            world_to_screen_matrix: projection * view_matrix,
            view_matrix,
            eye_position: eye,
            fov,
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// Write the parameters to `data`, the way a camera does.
    ///
    /// `worldToScreenMatrix` is written last: observers keyed on it see a
    /// complete set of values.
    pub fn publish(&self, data: &Provider) {
        data.set(properties::VIEW_MATRIX, self.view_matrix);
        data.set(properties::EYE_POSITION, self.eye_position);
        data.set(properties::FOV, self.fov);
        data.set(properties::ASPECT_RATIO, self.aspect_ratio);
        data.set(properties::Z_NEAR, self.z_near);
        data.set(properties::Z_FAR, self.z_far);
        data.set(properties::WORLD_TO_SCREEN_MATRIX, self.world_to_screen_matrix);
    }
}

/// Latest viewport and view reported by the bound collaborators.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ViewTracker {
    pub(crate) viewport: Option<Vec4>,
    pub(crate) view: Option<ViewParams>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_requires_world_to_screen() {
        let data = Provider::new();
        data.set(properties::FOV, 1.0_f32);
        assert!(ViewParams::from_provider(&data).is_none());

        data.set(properties::WORLD_TO_SCREEN_MATRIX, Mat4::from_scale(Vec3::splat(2.0)));
        let view = ViewParams::from_provider(&data).unwrap();
        assert_eq!(view.fov, 1.0);
        assert_eq!(view.view_matrix, Mat4::IDENTITY);
    }

    #[test]
    fn test_publish_then_read_back() {
        let data = Provider::new();
        let view = ViewParams::perspective(Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, 0.8, 16.0 / 9.0, 0.1, 1000.0);
        view.publish(&data);
        assert_eq!(ViewParams::from_provider(&data), Some(view));
    }

    #[test]
    fn test_publish_announces_world_to_screen_last() {
        let data = Provider::new();
        let names = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let n = std::rc::Rc::clone(&names);
        let _sub = data
            .property_changed()
            .connect(move |change| n.borrow_mut().push(change.name.clone()));

        ViewParams::perspective(Vec3::Z, Vec3::ZERO, 1.0, 1.0, 0.1, 10.0).publish(&data);

        assert_eq!(names.borrow().last().map(String::as_str), Some(properties::WORLD_TO_SCREEN_MATRIX));
    }
}
