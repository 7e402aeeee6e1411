// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC to USD conversion core
//!
//! Turns a resolved IFC entity graph into a scene through the
//! [`SceneSink`](ifc_usd_model::SceneSink) contract:
//!
//! - [`style`]: material containers and styled geometry to cached
//!   preview-surface parameters
//! - [`metadata`]: identity, classification, property sets, relationships,
//!   provenance and presentation layers as scalar metadata records
//! - [`walker`]: the spatial hierarchy traversal with reconciliation of
//!   unreached spaces
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_usd_convert::{convert_model, ConvertSettings, NullSink};
//!
//! let report = convert_model(&resolver, &router, &mut stage, &mut NullSink, &ConvertSettings::default());
//! println!("{}", report);
//! ```

pub mod error;
pub mod events;
pub mod metadata;
pub mod naming;
pub mod scalarize;
pub mod settings;
pub mod style;
pub mod walker;

pub use error::{ConvertError, Result};
pub use events::{JsonLinesSink, NullSink, ProgressEvent, ProgressSink};
pub use metadata::MetadataExtractor;
pub use naming::{material_key, node_name, sanitize};
pub use scalarize::scalarize;
pub use settings::ConvertSettings;
pub use style::{MaterialContainer, MaterialIndex, ShadingParameters, StyleEngine};
pub use walker::{convert_model, ConversionReport, RunContext};
