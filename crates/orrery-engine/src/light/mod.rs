//! Light attribute bundles and the viewer's own light list.
//!
//! Lights are shared `Rc` handles owned by whoever manages them; the viewer
//! only references them and reads their attributes at render time.

mod attributes;
mod list;

pub use attributes::{Attenuation, Light, LightKind};
pub use list::LightList;
