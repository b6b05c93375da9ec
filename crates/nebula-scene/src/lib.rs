//! Scene graph collaborators: nodes, layouts, components, data providers and signals.
//!
//! Everything here is single-threaded. Shared objects are `Rc` handles with
//! interior mutability, and observers hold [`Subscription`] guards that
//! disconnect when dropped.

mod component;
mod error;
mod graph;
mod layout;
mod provider;
mod signal;

pub use component::{
    Component, ComponentKind, FrameTick, Renderer, SceneManager, Surface, SurfaceId, downcast,
    same_component,
};
pub use error::SceneError;
pub use graph::{NodeId, SceneEvent, SceneGraph};
pub use layout::Layout;
pub use provider::{PropertyChanged, PropertyValue, Provider, Value};
pub use signal::{Signal, Subscription};
