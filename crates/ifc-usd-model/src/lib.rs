// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-USD Model - Trait definitions and shared types for IFC to USD conversion
//!
//! This crate provides the abstractions the converter is written against. The
//! STEP reader, the tessellator and the USD stage are separate crates that
//! implement these traits, so the conversion core never depends on a concrete
//! backend.
//!
//! # Architecture
//!
//! - [`IfcParser`] - Entry point for parsing IFC content
//! - [`IfcModel`] - Read-only access to a parsed IFC model
//! - [`EntityResolver`] - Entity lookup, forward and inverse attribute access
//! - [`Tessellator`] - Triangulated geometry for a product
//! - [`SceneSink`] - Hierarchical output scene (prims, meshes, materials)
//!
//! Entity attributes are positional in STEP files. The [`schema`] module maps
//! attribute names onto positions along the type's supertype chain, so callers
//! can write `entity.attr("Name")` instead of remembering indices.
//!
//! # Example
//!
//! ```ignore
//! use ifc_usd_model::{EntityResolverExt, IfcModel, IfcType};
//!
//! let resolver = model.resolver();
//! for space in resolver.instances_of(&IfcType::IfcSpace) {
//!     println!("{} {:?}", space.id, space.attr_str("Name"));
//!     for rel in resolver.inverse_of(&space, "ContainsElements") {
//!         println!("  contains via {}", rel.id);
//!     }
//! }
//! ```

pub mod error;
pub mod geometry;
pub mod resolver;
pub mod scene;
pub mod schema;
pub mod traits;
pub mod types;

// Re-export all public types
pub use error::*;
pub use geometry::*;
pub use resolver::*;
pub use scene::*;
pub use traits::*;
pub use types::*;
