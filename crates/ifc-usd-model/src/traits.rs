// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser and model seams
//!
//! The converter only ever sees a model through [`IfcModel`], so any STEP
//! front end that can hand out an [`EntityResolver`] can drive a conversion.

use crate::{EntityResolver, ModelMetadata, Result};
use std::sync::Arc;

/// Called with (phase, fraction in `0.0..=1.0`) while a file is parsed
pub type ProgressCallback = Box<dyn Fn(&str, f32) + Send>;

/// Turns STEP text into a model
///
/// ```ignore
/// let model = StepParser::new().parse(&text)?;
/// log::info!("{} entities, schema {}",
///     model.resolver().entity_count(),
///     model.metadata().schema_version);
/// ```
pub trait IfcParser: Send + Sync {
    fn parse(&self, content: &str) -> Result<Arc<dyn IfcModel>>;

    /// Same as [`IfcParser::parse`], reporting scan and index phases.
    fn parse_with_progress(
        &self,
        content: &str,
        on_progress: ProgressCallback,
    ) -> Result<Arc<dyn IfcModel>>;
}

/// A parsed file, immutable after construction
pub trait IfcModel: Send + Sync {
    /// Entity lookup and reference resolution for the walker
    fn resolver(&self) -> &dyn EntityResolver;

    /// Meters per file length unit, written to the stage as `metersPerUnit`
    /// (0.001 for a millimeter project).
    fn unit_scale(&self) -> f64;

    /// Header data from `FILE_NAME` and `FILE_SCHEMA`
    fn metadata(&self) -> &ModelMetadata;
}
