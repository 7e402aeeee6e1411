// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for geometry processing

use ifc_usd_model::{EntityId, GeometryError};
use thiserror::Error;

/// Geometry processing result type
pub type Result<T> = std::result::Result<T, Error>;

/// Geometry processing errors
///
/// Internal to the processors; the router maps them onto
/// [`GeometryError`] for the entity being tessellated.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry processing error
    #[error("Geometry error: {0}")]
    Geometry(String),

    /// Missing entity error
    #[error("Entity not found: #{0}")]
    EntityNotFound(u32),

    /// Missing or malformed attribute
    #[error("Invalid attribute {attribute} on #{entity}: {message}")]
    InvalidAttribute {
        entity: u32,
        attribute: &'static str,
        message: String,
    },

    /// Profile processing error
    #[error("Profile error: {0}")]
    Profile(String),

    /// Triangulation error
    #[error("Triangulation error: {0}")]
    Triangulation(String),

    /// Unsupported geometry type
    #[error("Unsupported geometry type: {0}")]
    UnsupportedType(String),
}

impl Error {
    /// Create a geometry error
    pub fn geometry(msg: impl Into<String>) -> Self {
        Error::Geometry(msg.into())
    }

    /// Create a profile error
    pub fn profile(msg: impl Into<String>) -> Self {
        Error::Profile(msg.into())
    }

    /// Create a triangulation error
    pub fn triangulation(msg: impl Into<String>) -> Self {
        Error::Triangulation(msg.into())
    }

    /// Create an entity not found error
    pub fn entity_not_found(id: EntityId) -> Self {
        Error::EntityNotFound(id.0)
    }

    /// Attribute `attribute` of `entity` is missing or has the wrong shape
    pub fn missing(entity: EntityId, attribute: &'static str) -> Self {
        Error::InvalidAttribute {
            entity: entity.0,
            attribute,
            message: "missing or malformed".to_string(),
        }
    }

    /// Create an unsupported type error
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Error::UnsupportedType(type_name.into())
    }

    /// Report this error against the entity being tessellated
    pub fn for_entity(self, entity: EntityId) -> GeometryError {
        match self {
            Error::UnsupportedType(type_name) => GeometryError::Unsupported { entity, type_name },
            other => GeometryError::failed(entity, other.to_string()),
        }
    }
}
