use std::fmt;

/// Failure from the projection calculator or a camera mutation.
///
/// On error the caller's camera and matrices are left untouched.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// Viewport width or height is not positive.
    InvalidViewport,
    /// Extents are inverted or the clip planes are not `0 < near < far`.
    InvalidViewingVolume,
    /// A combined matrix could not be inverted.
    SingularMatrix,
    /// A direction vector had zero length.
    ZeroVector,
    /// The up vector is (nearly) parallel to the view direction.
    ParallelUpVector,
    /// Argument outside its allowed range.
    OutOfRange(&'static str),
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidViewport => write!(f, "viewport has no area"),
            Self::InvalidViewingVolume => write!(f, "invalid viewing volume"),
            Self::SingularMatrix => write!(f, "transformation matrix is singular"),
            Self::ZeroVector => write!(f, "zero-length direction vector"),
            Self::ParallelUpVector => write!(f, "up vector is parallel to the view direction"),
            Self::OutOfRange(what) => write!(f, "{what} out of range"),
        }
    }
}

impl std::error::Error for ProjectionError {}
