use std::fmt;

use crate::projection::ProjectionError;

/// Why a viewer setter or query was rejected. State is unchanged on error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewerError {
    InvalidArgument(&'static str),
    /// The graphics context lacks a capability the setting needs.
    Unsupported(&'static str),
    NotFound,
    AlreadyExists,
    Projection(ProjectionError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(what) => write!(f, "invalid {what}"),
            Self::Unsupported(what) => write!(f, "{what} not supported by the graphics context"),
            Self::NotFound => write!(f, "not found"),
            Self::AlreadyExists => write!(f, "already present"),
            Self::Projection(e) => write!(f, "projection: {e}"),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Projection(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProjectionError> for ViewerError {
    fn from(e: ProjectionError) -> Self {
        Self::Projection(e)
    }
}
