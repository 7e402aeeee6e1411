// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Style resolution: from material associations and styled geometry to
//! preview-surface parameters

pub mod container;
pub mod engine;
pub mod index;
pub mod presentation;
pub mod shading;

pub use container::MaterialContainer;
pub use engine::{EmbeddedStyle, StyleEngine, DEFAULT_MATERIAL};
pub use index::{MaterialIndex, MaterialIndexBuilder, RenderingConvention};
pub use shading::{DiffuseTerm, ReflectanceMethod, ResolvedStyle, ShadingParameters, Specular};
