//! Matrix/vector kernel and coordinate-system conversion.
//!
//! Conventions:
//! - `f64` throughout; rendering converts to `f32` only at the GPU boundary.
//! - Matrices are row-major and act on column vectors (`p' = M · p`), so a
//!   transform applied after `A` is written `B * A`.
//! - Inverses go through an LU decomposition with partial pivoting and
//!   report singular input as `None` instead of producing infinities.

pub mod coordinate_system;
mod lu;
mod mat3;
mod mat4;
mod vec3;

pub use coordinate_system::{CoordinateError, CoordinateSystem};
pub use mat3::Mat3;
pub use mat4::Mat4;
pub use vec3::Vec3;
