//! Interactive navigation: pointer drags to camera motion.
//!
//! Buttons pick a mode on press (tumble, translate, zoom or fly), motion
//! events apply it through unprojection with the frame matrices, and release
//! may leave a tumble spinning.

mod controller;
mod fly;
mod tumble;

pub use controller::{DragMode, FreeSpin, NavigationController, NavigationRates, NavigationTarget};
pub use fly::{fly, FlyPlanes, NEAR_FAR_MINIMUM_RATIO};
pub use tumble::{tumble, Tumble};
