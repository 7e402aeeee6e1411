// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-USD Stage
//!
//! In-memory USD stage implementing the `SceneSink` trait from
//! `ifc-usd-model`, and a writer for the USDA text format.
//!
//! Materials are `Material` prims wired to a `UsdPreviewSurface` shader.
//! Face subsets are `GeomSubset` prims in the `materialBind` family.
//!
//! ```rust,ignore
//! use ifc_usd_stage::Stage;
//! use ifc_usd_model::{PrimPath, SceneSink};
//!
//! let mut stage = Stage::new();
//! stage.set_default_prim("World");
//! stage.define_xform(&PrimPath::root("World"));
//! stage.save("building.usda")?;
//! ```

pub mod error;
pub mod stage;
pub mod usda;

pub use error::{Result, StageError};
pub use stage::{Attribute, Prim, PrimKind, Stage, StageMetadata, UsdValue, SURFACE_SHADER};
pub use usda::UsdaWriter;
