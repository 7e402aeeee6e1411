// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rendering styles and the shading parameters derived from them
//!
//! | Parameter | Source | Default |
//! |---|---|---|
//! | diffuse colour | `SurfaceColour`, then `DiffuseColour` (colour replaces, ratio multiplies) | 0.7 grey |
//! | opacity | `1 - Transparency`, clamped to `[0, 1]` | 1.0 |
//! | roughness | `IfcSpecularRoughness`, or `sqrt(2 / (e + 2))` for an exponent `e > 0`, clamped to `[0.35, 1]` | 0.8 |
//! | metallic | 1.0 for `METAL` and `MIRROR` reflectance | 0.0 |
//!
//! `MATT` reflectance forces roughness to 1.0. Missing or malformed fields
//! keep their default.

use ifc_usd_model::{AttributeValue, DecodedEntity, EntityResolver, EntityResolverExt, ShaderInput};

pub const DEFAULT_DIFFUSE: [f32; 3] = [0.7, 0.7, 0.7];
pub const DEFAULT_OPACITY: f32 = 1.0;
pub const DEFAULT_ROUGHNESS: f32 = 0.8;
pub const MIN_ROUGHNESS: f32 = 0.35;

/// Diffuse term of a rendering
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DiffuseTerm {
    Colour([f64; 3]),
    /// Normalised ratio applied to the surface colour
    Factor(f64),
}

/// Specular highlight, classified by its measure type
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Specular {
    Roughness(f64),
    Exponent(f64),
}

/// `IfcReflectanceMethodEnum`, reduced to what changes shading
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReflectanceMethod {
    #[default]
    Default,
    Metal,
    Mirror,
    Matte,
    Other(String),
}

impl ReflectanceMethod {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "MATT" => ReflectanceMethod::Matte,
            "METAL" => ReflectanceMethod::Metal,
            "MIRROR" => ReflectanceMethod::Mirror,
            "NOTDEFINED" | "" => ReflectanceMethod::Default,
            other => ReflectanceMethod::Other(other.to_string()),
        }
    }
}

/// The shading-relevant fields of an `IfcSurfaceStyleShading` or `IfcSurfaceStyleRendering`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedStyle {
    pub surface_colour: Option<[f64; 3]>,
    pub diffuse: Option<DiffuseTerm>,
    pub transparency: Option<f64>,
    pub specular: Option<Specular>,
    pub reflectance: ReflectanceMethod,
}

impl ResolvedStyle {
    /// Read a rendering entity; fields that are absent or malformed stay `None`
    pub fn from_rendering(rendering: &DecodedEntity, resolver: &dyn EntityResolver) -> Self {
        Self {
            surface_colour: resolver
                .attr_entity(rendering, "SurfaceColour")
                .and_then(|c| colour_rgb(&c)),
            diffuse: rendering
                .attr("DiffuseColour")
                .and_then(|v| diffuse_term(v, resolver)),
            transparency: rendering
                .attr_float("Transparency")
                .filter(|t| t.is_finite()),
            specular: rendering.attr("SpecularHighlight").and_then(specular),
            reflectance: rendering
                .attr_enum("ReflectanceMethod")
                .map(ReflectanceMethod::parse)
                .unwrap_or_default(),
        }
    }
}

/// Components of an `IfcColourRgb`, `None` unless all three are ratios
pub fn colour_rgb(colour: &DecodedEntity) -> Option<[f64; 3]> {
    let rgb = [
        colour.attr_float("Red")?,
        colour.attr_float("Green")?,
        colour.attr_float("Blue")?,
    ];
    rgb.iter().all(|c| (0.0..=1.0).contains(c)).then_some(rgb)
}

fn diffuse_term(value: &AttributeValue, resolver: &dyn EntityResolver) -> Option<DiffuseTerm> {
    match value {
        AttributeValue::EntityRef(_) => resolver
            .resolve_ref(value)
            .and_then(|c| colour_rgb(&c))
            .map(DiffuseTerm::Colour),
        _ => value
            .as_float()
            .filter(|f| (0.0..=1.0).contains(f))
            .map(DiffuseTerm::Factor),
    }
}

fn specular(value: &AttributeValue) -> Option<Specular> {
    let (tag, inner) = value.as_typed()?;
    let v = inner.as_float().filter(|v| v.is_finite())?;
    match tag.to_ascii_uppercase().as_str() {
        "IFCSPECULARROUGHNESS" => Some(Specular::Roughness(v)),
        "IFCSPECULAREXPONENT" => Some(Specular::Exponent(v)),
        _ => None,
    }
}

/// Normalised preview-surface inputs
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingParameters {
    pub diffuse_color: [f32; 3],
    pub opacity: f32,
    pub roughness: f32,
    pub metallic: f32,
}

impl Default for ShadingParameters {
    fn default() -> Self {
        Self {
            diffuse_color: DEFAULT_DIFFUSE,
            opacity: DEFAULT_OPACITY,
            roughness: DEFAULT_ROUGHNESS,
            metallic: 0.0,
        }
    }
}

impl ShadingParameters {
    pub fn from_style(style: &ResolvedStyle) -> Self {
        let mut params = Self::default();

        if let Some(rgb) = style.surface_colour {
            params.diffuse_color = rgb.map(|c| c as f32);
        }

        match style.diffuse {
            Some(DiffuseTerm::Colour(rgb)) => params.diffuse_color = rgb.map(|c| c as f32),
            Some(DiffuseTerm::Factor(f)) => {
                params.diffuse_color = params.diffuse_color.map(|c| c * f as f32)
            }
            None => {}
        }

        if let Some(t) = style.transparency {
            params.opacity = (1.0 - t).clamp(0.0, 1.0) as f32;
        }

        match style.specular {
            Some(Specular::Roughness(r)) => params.roughness = clamp_roughness(r),
            Some(Specular::Exponent(e)) if e > 0.0 => {
                params.roughness = clamp_roughness((2.0 / (e + 2.0)).sqrt())
            }
            _ => {}
        }

        match style.reflectance {
            ReflectanceMethod::Metal | ReflectanceMethod::Mirror => params.metallic = 1.0,
            ReflectanceMethod::Matte => params.roughness = 1.0,
            ReflectanceMethod::Default | ReflectanceMethod::Other(_) => {}
        }

        params
    }

    /// `UsdPreviewSurface` inputs
    pub fn shader_inputs(&self) -> Vec<ShaderInput> {
        vec![
            ShaderInput::color("diffuseColor", self.diffuse_color),
            ShaderInput::float("opacity", self.opacity),
            ShaderInput::float("roughness", self.roughness),
            ShaderInput::float("metallic", self.metallic),
        ]
    }
}

fn clamp_roughness(value: f64) -> f32 {
    (value as f32).clamp(MIN_ROUGHNESS, 1.0)
}
