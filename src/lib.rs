//! Live cursor presence with a fabricated-visitor simulator.
//!
//! SYSTEM CONTEXT
//! ==============
//! A page publishes its visitor's pointer to a shared channel, draws every
//! other visitor's pointer, and shows an "N visitors online" count. When real
//! traffic is thin, synthetic visitors wander the page through the same
//! rendering path so the site never feels empty.
//!
//! Modules, leaf to root:
//! - `identity`: session id, deterministic color and label
//! - `frame`, `transport`: wire envelope, hub, in-memory and websocket adapters
//! - `tracker`: throttled outbound samples, remote cursor table with liveness
//! - `simulator`: fabricated visitor population and motion
//! - `presence`: merged online count
//! - `render`: local cursor morphing and remote marker smoothing
//! - `live`: the task that owns it all and publishes a `CursorView`
//! - `relay`: axum server exposing a hub over `/ws`

pub mod config;
pub mod frame;
pub mod identity;
pub mod live;
pub mod presence;
pub mod relay;
pub mod render;
pub mod simulator;
pub mod tracker;
pub mod transport;

pub use live::{CursorView, LiveCursors, LiveOptions};
