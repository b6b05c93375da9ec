//! Property names shared with loaders, renderers and scene managers.

/// Written by the scheduler: LOD the loader must reach (`i32`).
pub const REQUIRED_LOD: &str = "requiredLod";
/// Written by the scheduler: loader priority (`f32`).
pub const PRIORITY: &str = "priority";
/// Written by loaders: highest LOD currently streamed in (`i32`).
pub const MAX_AVAILABLE_LOD: &str = "maxAvailableLod";

/// On the scene manager's root node: viewport rectangle (`Vec4`).
pub const VIEWPORT: &str = "viewport";

/// On the renderer's camera node. `worldToScreenMatrix` is the trigger: the
/// other view properties must be published before it.
pub const WORLD_TO_SCREEN_MATRIX: &str = "worldToScreenMatrix";
pub const VIEW_MATRIX: &str = "viewMatrix";
pub const EYE_POSITION: &str = "eyePosition";
pub const FOV: &str = "fov";
pub const ASPECT_RATIO: &str = "aspectRatio";
pub const Z_NEAR: &str = "zNear";
pub const Z_FAR: &str = "zFar";
