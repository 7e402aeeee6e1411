// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for IFC parsing and tessellation

use crate::EntityId;
use thiserror::Error;

/// Result type alias for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur during IFC parsing
#[derive(Error, Debug)]
pub enum ParseError {
    /// Invalid IFC file format
    #[error("Invalid IFC format: {0}")]
    InvalidFormat(String),

    /// Failed to parse header section
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Failed to parse entity
    #[error("Failed to parse entity {0}: {1}")]
    EntityParse(EntityId, String),

    /// Entity not found
    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    /// Invalid entity reference
    #[error("Invalid entity reference at {entity}: attribute {attribute}")]
    InvalidReference { entity: EntityId, attribute: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }

    /// Create a new entity parse error
    pub fn entity_parse(id: EntityId, msg: impl Into<String>) -> Self {
        ParseError::EntityParse(id, msg.into())
    }
}

/// Why a product could not be tessellated
///
/// [`GeometryError::NoRepresentation`] and [`GeometryError::NoGeometry`] are
/// routine (spatial containers, abstract products, empty bodies) and callers
/// skip them silently. The remaining kinds are worth a warning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The product has no shape representation at all
    #[error("Entity {0} has no representation")]
    NoRepresentation(EntityId),

    /// The representation exists but yields no triangles
    #[error("Entity {0} has no geometry")]
    NoGeometry(EntityId),

    /// Every body item uses a geometry type without a processor
    #[error("Entity {entity}: unsupported geometry type {type_name}")]
    Unsupported { entity: EntityId, type_name: String },

    /// Processing failed on malformed or inconsistent data
    #[error("Geometry error for entity {entity}: {message}")]
    Failed { entity: EntityId, message: String },
}

impl GeometryError {
    /// Create a processing failure
    pub fn failed(entity: EntityId, msg: impl Into<String>) -> Self {
        GeometryError::Failed {
            entity,
            message: msg.into(),
        }
    }

    /// True for the two kinds that signal "nothing to draw" rather than a fault
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            GeometryError::NoRepresentation(_) | GeometryError::NoGeometry(_)
        )
    }
}
