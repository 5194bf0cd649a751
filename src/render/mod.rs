//! Render models for the local and remote cursors.
//!
//! Nothing here draws. Hosts feed input events and the merged cursor view,
//! step the models once per frame, and paint the returned positions, sizes,
//! colors, and opacities with whatever UI layer they use.

pub mod dom;
pub mod local;
pub mod remote;
pub mod spring;

#[cfg(test)]
pub(crate) mod test_tree;

pub use local::{CursorVariant, LocalCursor, LocalCursorModel};
pub use remote::{RemoteCursorLayer, RemoteMarkerModel};
