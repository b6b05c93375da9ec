//! Level-of-detail scheduling: per-frame LOD requirements for the resources
//! drawn by a scene's surfaces.
//!
//! A [`LodScheduler`] is attached to a scene node like any other component. It
//! follows the structure of the node's tree, binds to the scene manager,
//! renderer and [`MasterLodScheduler`] it finds there, and asks its
//! [`LodPolicy`] for new requirements when resources are invalidated.

mod lod_info;
mod master;
mod policy;
pub mod properties;
mod registry;
mod resolvers;
mod scheduler;
mod surfaces;
mod view;


pub use lod_info::{DEFAULT_LOD, DEFAULT_PRIORITY, LodInfo};
pub use master::MasterLodScheduler;
pub use policy::{LodPolicy, write_lod_info};
pub use registry::ResourceInfo;
pub use resolvers::{Resolver, Resolvers, default_master, default_renderer, default_scene_manager};
pub use scheduler::LodScheduler;
pub use surfaces::is_visible;
pub use view::ViewParams;
