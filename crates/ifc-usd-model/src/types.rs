// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for IFC data representation
//!
//! This module defines the fundamental types used throughout the conversion
//! pipeline: entity identifiers, the entity type vocabulary with its
//! inheritance chain, decoded attribute values and mesh buffers.

use crate::schema;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Type-safe entity identifier
///
/// Wraps the raw IFC entity ID (e.g., #123 becomes EntityId(123))
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default,
)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Declares the type vocabulary together with each type's direct supertype.
macro_rules! ifc_types {
    ($( $variant:ident $(: $parent:ident)? ),* $(,)?) => {
        /// IFC entity type enumeration
        ///
        /// Covers every type the converter reads. Unknown types are captured
        /// with their original (uppercased) STEP name.
        #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub enum IfcType {
            $( $variant, )*
            /// Unknown type - stores the original type name string
            Unknown(String),
        }

        impl IfcType {
            /// Get the schema spelling of the type name (e.g. `IfcWall`)
            pub fn name(&self) -> &str {
                match self {
                    $( IfcType::$variant => stringify!($variant), )*
                    IfcType::Unknown(s) => s,
                }
            }

            /// Direct supertype, `None` for roots and unknown types
            pub fn supertype(&self) -> Option<IfcType> {
                match self {
                    $( IfcType::$variant => None $( .or(Some(IfcType::$parent)) )?, )*
                    IfcType::Unknown(_) => None,
                }
            }

            fn lookup_table() -> &'static FxHashMap<String, IfcType> {
                static TABLE: OnceLock<FxHashMap<String, IfcType>> = OnceLock::new();
                TABLE.get_or_init(|| {
                    let mut table = FxHashMap::default();
                    $( table.insert(stringify!($variant).to_ascii_uppercase(), IfcType::$variant); )*
                    table
                })
            }
        }
    };
}

ifc_types! {
    // Roots
    IfcRoot,
    IfcObjectDefinition: IfcRoot,
    IfcObject: IfcObjectDefinition,
    IfcContext: IfcObject,
    IfcProject: IfcContext,
    IfcProduct: IfcObject,

    // Spatial structure
    IfcSpatialElement: IfcProduct,
    IfcSpatialStructureElement: IfcSpatialElement,
    IfcSite: IfcSpatialStructureElement,
    IfcBuilding: IfcSpatialStructureElement,
    IfcBuildingStorey: IfcSpatialStructureElement,
    IfcSpace: IfcSpatialStructureElement,
    IfcFacility: IfcSpatialStructureElement,
    IfcFacilityPart: IfcSpatialStructureElement,
    IfcBridge: IfcFacility,
    IfcRoad: IfcFacility,
    IfcRailway: IfcFacility,

    // Elements
    IfcElement: IfcProduct,
    IfcBuildingElement: IfcElement,
    IfcWall: IfcBuildingElement,
    IfcWallStandardCase: IfcWall,
    IfcCurtainWall: IfcBuildingElement,
    IfcSlab: IfcBuildingElement,
    IfcRoof: IfcBuildingElement,
    IfcBeam: IfcBuildingElement,
    IfcColumn: IfcBuildingElement,
    IfcDoor: IfcBuildingElement,
    IfcWindow: IfcBuildingElement,
    IfcStair: IfcBuildingElement,
    IfcStairFlight: IfcBuildingElement,
    IfcRamp: IfcBuildingElement,
    IfcRampFlight: IfcBuildingElement,
    IfcRailing: IfcBuildingElement,
    IfcCovering: IfcBuildingElement,
    IfcPlate: IfcBuildingElement,
    IfcMember: IfcBuildingElement,
    IfcFooting: IfcBuildingElement,
    IfcPile: IfcBuildingElement,
    IfcChimney: IfcBuildingElement,
    IfcShadingDevice: IfcBuildingElement,
    IfcBuildingElementProxy: IfcBuildingElement,
    IfcFeatureElement: IfcElement,
    IfcFeatureElementSubtraction: IfcFeatureElement,
    IfcOpeningElement: IfcFeatureElementSubtraction,
    IfcOpeningStandardCase: IfcOpeningElement,
    IfcDistributionElement: IfcElement,
    IfcDistributionFlowElement: IfcDistributionElement,
    IfcFlowTerminal: IfcDistributionFlowElement,
    IfcFlowSegment: IfcDistributionFlowElement,
    IfcFlowFitting: IfcDistributionFlowElement,
    IfcFlowController: IfcDistributionFlowElement,
    IfcFurnishingElement: IfcElement,
    IfcFurniture: IfcFurnishingElement,
    IfcElementAssembly: IfcElement,
    IfcVirtualElement: IfcElement,
    IfcAnnotation: IfcProduct,
    IfcGrid: IfcProduct,

    // Type objects
    IfcTypeObject: IfcObjectDefinition,
    IfcTypeProduct: IfcTypeObject,
    IfcElementType: IfcTypeProduct,
    IfcBuildingElementType: IfcElementType,
    IfcWallType: IfcBuildingElementType,
    IfcSlabType: IfcBuildingElementType,
    IfcBeamType: IfcBuildingElementType,
    IfcColumnType: IfcBuildingElementType,
    IfcDoorType: IfcBuildingElementType,
    IfcWindowType: IfcBuildingElementType,
    IfcMemberType: IfcBuildingElementType,
    IfcPlateType: IfcBuildingElementType,
    IfcCoveringType: IfcBuildingElementType,
    IfcRailingType: IfcBuildingElementType,
    IfcBuildingElementProxyType: IfcBuildingElementType,
    IfcDoorStyle: IfcTypeProduct,
    IfcWindowStyle: IfcTypeProduct,

    // Relationships
    IfcRelationship: IfcRoot,
    IfcRelDecomposes: IfcRelationship,
    IfcRelAggregates: IfcRelDecomposes,
    IfcRelNests: IfcRelDecomposes,
    IfcRelConnects: IfcRelationship,
    IfcRelContainedInSpatialStructure: IfcRelConnects,
    IfcRelVoidsElement: IfcRelConnects,
    IfcRelFillsElement: IfcRelConnects,
    IfcRelSpaceBoundary: IfcRelConnects,
    IfcRelAssociates: IfcRelationship,
    IfcRelAssociatesMaterial: IfcRelAssociates,
    IfcRelAssociatesClassification: IfcRelAssociates,
    IfcRelDefines: IfcRelationship,
    IfcRelDefinesByProperties: IfcRelDefines,
    IfcRelDefinesByType: IfcRelDefines,

    // Property definitions
    IfcPropertyDefinition: IfcRoot,
    IfcPropertySetDefinition: IfcPropertyDefinition,
    IfcPropertySet: IfcPropertySetDefinition,
    IfcElementQuantity: IfcPropertySetDefinition,
    IfcProperty,
    IfcSimpleProperty: IfcProperty,
    IfcPropertySingleValue: IfcSimpleProperty,
    IfcPropertyEnumeratedValue: IfcSimpleProperty,
    IfcPropertyListValue: IfcSimpleProperty,
    IfcPropertyBoundedValue: IfcSimpleProperty,

    // Materials
    IfcMaterialDefinition,
    IfcMaterial: IfcMaterialDefinition,
    IfcMaterialLayer: IfcMaterialDefinition,
    IfcMaterialLayerSet: IfcMaterialDefinition,
    IfcMaterialProfile: IfcMaterialDefinition,
    IfcMaterialProfileSet: IfcMaterialDefinition,
    IfcMaterialConstituent: IfcMaterialDefinition,
    IfcMaterialConstituentSet: IfcMaterialDefinition,
    IfcMaterialUsageDefinition,
    IfcMaterialLayerSetUsage: IfcMaterialUsageDefinition,
    IfcMaterialProfileSetUsage: IfcMaterialUsageDefinition,
    IfcMaterialList,

    // Representations
    IfcProductRepresentation,
    IfcProductDefinitionShape: IfcProductRepresentation,
    IfcMaterialDefinitionRepresentation: IfcProductRepresentation,
    IfcRepresentation,
    IfcShapeModel: IfcRepresentation,
    IfcShapeRepresentation: IfcShapeModel,
    IfcStyleModel: IfcRepresentation,
    IfcStyledRepresentation: IfcStyleModel,
    IfcRepresentationMap,
    IfcRepresentationItem,
    IfcMappedItem: IfcRepresentationItem,
    IfcStyledItem: IfcRepresentationItem,
    IfcGeometricRepresentationItem: IfcRepresentationItem,

    // Geometry
    IfcCartesianPoint: IfcGeometricRepresentationItem,
    IfcDirection: IfcGeometricRepresentationItem,
    IfcPlacement: IfcGeometricRepresentationItem,
    IfcAxis2Placement2D: IfcPlacement,
    IfcAxis2Placement3D: IfcPlacement,
    IfcCartesianTransformationOperator: IfcGeometricRepresentationItem,
    IfcCartesianTransformationOperator3D: IfcCartesianTransformationOperator,
    IfcCartesianTransformationOperator3DnonUniform: IfcCartesianTransformationOperator3D,
    IfcCartesianPointList3D: IfcGeometricRepresentationItem,
    IfcCartesianPointList2D: IfcGeometricRepresentationItem,
    IfcPolyline: IfcGeometricRepresentationItem,
    IfcIndexedPolyCurve: IfcGeometricRepresentationItem,
    IfcExtrudedAreaSolid: IfcGeometricRepresentationItem,
    IfcTriangulatedFaceSet: IfcGeometricRepresentationItem,
    IfcPolygonalFaceSet: IfcGeometricRepresentationItem,
    IfcIndexedPolygonalFace: IfcGeometricRepresentationItem,
    IfcFacetedBrep: IfcGeometricRepresentationItem,
    IfcClosedShell: IfcGeometricRepresentationItem,
    IfcFace: IfcGeometricRepresentationItem,
    IfcFaceBound: IfcGeometricRepresentationItem,
    IfcFaceOuterBound: IfcFaceBound,
    IfcPolyLoop: IfcGeometricRepresentationItem,
    IfcBooleanResult: IfcGeometricRepresentationItem,
    IfcBooleanClippingResult: IfcBooleanResult,
    IfcProfileDef,
    IfcParameterizedProfileDef: IfcProfileDef,
    IfcRectangleProfileDef: IfcParameterizedProfileDef,
    IfcCircleProfileDef: IfcParameterizedProfileDef,
    IfcCircleHollowProfileDef: IfcCircleProfileDef,
    IfcArbitraryClosedProfileDef: IfcProfileDef,
    IfcArbitraryProfileDefWithVoids: IfcArbitraryClosedProfileDef,
    IfcObjectPlacement,
    IfcLocalPlacement: IfcObjectPlacement,

    // Presentation
    IfcPresentationStyle,
    IfcSurfaceStyle: IfcPresentationStyle,
    IfcPresentationStyleAssignment,
    IfcSurfaceStyleShading,
    IfcSurfaceStyleRendering: IfcSurfaceStyleShading,
    IfcColourSpecification,
    IfcColourRgb: IfcColourSpecification,
    IfcPresentationLayerAssignment,
    IfcPresentationLayerWithStyle: IfcPresentationLayerAssignment,

    // Classification
    IfcExternalReference,
    IfcClassificationReference: IfcExternalReference,
    IfcClassification,

    // Actors and ownership
    IfcOwnerHistory,
    IfcPersonAndOrganization,
    IfcPerson,
    IfcOrganization,
    IfcActorRole,
    IfcApplication,

    // Units
    IfcUnitAssignment,
    IfcNamedUnit,
    IfcSIUnit: IfcNamedUnit,
    IfcConversionBasedUnit: IfcNamedUnit,
    IfcMeasureWithUnit,
}

impl FromStr for IfcType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl IfcType {
    /// Parse a type name string into an IfcType (case-insensitive)
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match Self::lookup_table().get(&upper) {
            Some(known) => known.clone(),
            None => IfcType::Unknown(upper),
        }
    }

    /// True when `self` is `other` or one of its subtypes
    pub fn is_a(&self, other: &IfcType) -> bool {
        if self == other {
            return true;
        }
        let mut current = self.supertype();
        while let Some(ty) = current {
            if &ty == other {
                return true;
            }
            current = ty.supertype();
        }
        false
    }

    /// Supertype chain from the root down to `self`
    pub fn lineage(&self) -> Vec<IfcType> {
        let mut chain = vec![self.clone()];
        let mut current = self.supertype();
        while let Some(ty) = current {
            current = ty.supertype();
            chain.push(ty);
        }
        chain.reverse();
        chain
    }

    /// Check if this type is a spatial structure element
    pub fn is_spatial(&self) -> bool {
        self.is_a(&IfcType::IfcSpatialElement) || *self == IfcType::IfcProject
    }

    /// Spaces are enclosures: kept in the output for their data, hidden by default
    pub fn is_spatial_enclosure(&self) -> bool {
        self.is_a(&IfcType::IfcSpace)
    }
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Decoded attribute value
///
/// Represents any value that can appear in an IFC entity's attribute list.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// Null value ($)
    #[default]
    Null,
    /// Derived value (*)
    Derived,
    /// Entity reference (#123)
    EntityRef(EntityId),
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Enumeration value (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value like IFCLABEL('text')
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    /// Try to get as entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_string(),
            _ => None,
        }
    }

    /// Try to get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_float(),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_integer(),
            _ => None,
        }
    }

    /// Try to get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Enum(s) => match s.to_uppercase().as_str() {
                "TRUE" | "T" => Some(true),
                "FALSE" | "F" => Some(false),
                _ => None,
            },
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_bool(),
            _ => None,
        }
    }

    /// Try to get as enum string
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Type tag and payload of a typed value such as `IFCSPECULAREXPONENT(64.)`
    pub fn as_typed(&self) -> Option<(&str, &AttributeValue)> {
        match self {
            AttributeValue::TypedValue(tag, args) => args.first().map(|v| (tag.as_str(), v)),
            _ => None,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Check if this is a derived value
    pub fn is_derived(&self) -> bool {
        matches!(self, AttributeValue::Derived)
    }
}

/// Decoded IFC entity
///
/// Represents a fully decoded IFC entity with its ID, type, and attribute values.
/// Attributes can be read by position (`get*`) or by schema name (`attr*`).
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    /// Entity ID
    pub id: EntityId,
    /// Entity type
    pub ifc_type: IfcType,
    /// Attribute values in order
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    /// Get attribute at index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference at index
    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string at index
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    /// Get float at index
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    /// Get list at index
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    /// Get list of entity references at index
    pub fn get_refs(&self, index: usize) -> Option<Vec<EntityId>> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
    }

    /// Position of a named attribute for this entity's type
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        schema::attribute_index(&self.ifc_type, name).or_else(|| self.rooted_fallback(name))
    }

    /// Get a named attribute; `None` when the type has no such attribute or it is unset
    pub fn attr(&self, name: &str) -> Option<&AttributeValue> {
        self.attribute_index(name)
            .and_then(|index| self.get(index))
            .filter(|v| !v.is_null() && !v.is_derived())
    }

    /// Get a named string attribute
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(|v| v.as_string())
    }

    /// Get a named numeric attribute
    pub fn attr_float(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(|v| v.as_float())
    }

    /// Get a named enumeration attribute
    pub fn attr_enum(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(|v| v.as_enum())
    }

    /// Get a named entity reference
    pub fn attr_ref(&self, name: &str) -> Option<EntityId> {
        self.attr(name).and_then(|v| v.as_entity_ref())
    }

    /// Get the references held by a named attribute, whether a single ref or a list
    pub fn attr_refs(&self, name: &str) -> Vec<EntityId> {
        match self.attr(name) {
            Some(AttributeValue::EntityRef(id)) => vec![*id],
            Some(AttributeValue::List(items)) => {
                items.iter().filter_map(|v| v.as_entity_ref()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// GlobalId of a rooted entity
    pub fn global_id(&self) -> Option<&str> {
        self.attr_str("GlobalId")
    }

    /// Name attribute, when the type has one
    pub fn name(&self) -> Option<&str> {
        self.attr_str("Name")
    }

    // Types outside the vocabulary still expose the IfcRoot attributes when
    // their first attribute looks like a 22 character GlobalId.
    fn rooted_fallback(&self, name: &str) -> Option<usize> {
        if !matches!(self.ifc_type, IfcType::Unknown(_)) {
            return None;
        }
        let looks_rooted = matches!(self.get(0), Some(AttributeValue::String(s)) if s.len() == 22);
        if looks_rooted {
            schema::attribute_index(&IfcType::IfcRoot, name)
        } else {
            None
        }
    }
}

/// Triangle mesh buffers
///
/// Contains flattened vertex data ready for a scene sink.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Vertex positions as flattened [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Vertex normals as flattened [nx, ny, nz, nx, ny, nz, ...]
    pub normals: Vec<f32>,
    /// Triangle indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Merge another mesh into this one
    pub fn merge(&mut self, other: &MeshData) {
        let vertex_offset = self.vertex_count() as u32;

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|i| i + vertex_offset));
    }
}

/// Model metadata extracted from IFC header
#[derive(Clone, Debug, Default)]
pub struct ModelMetadata {
    /// IFC schema version (e.g., "IFC2X3", "IFC4", "IFC4X3")
    pub schema_version: String,
    /// Originating system (CAD application)
    pub originating_system: Option<String>,
    /// Preprocessor version
    pub preprocessor_version: Option<String>,
    /// File name from header
    pub file_name: Option<String>,
    /// File description
    pub file_description: Option<String>,
    /// Author
    pub author: Option<String>,
    /// Organization
    pub organization: Option<String>,
    /// Timestamp
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(ifc_type: IfcType, attributes: Vec<AttributeValue>) -> DecodedEntity {
        DecodedEntity {
            id: EntityId(7),
            ifc_type,
            attributes,
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(IfcType::parse("IFCWALL"), IfcType::IfcWall);
        assert_eq!(IfcType::parse("IfcWall"), IfcType::IfcWall);
        assert_eq!(
            IfcType::parse("IfcTendon"),
            IfcType::Unknown("IFCTENDON".into())
        );
    }

    #[test]
    fn test_name_uses_schema_spelling() {
        assert_eq!(IfcType::IfcBuildingStorey.name(), "IfcBuildingStorey");
        assert_eq!(IfcType::IfcWallStandardCase.to_string(), "IfcWallStandardCase");
    }

    #[test]
    fn test_is_a_walks_supertypes() {
        assert!(IfcType::IfcWallStandardCase.is_a(&IfcType::IfcWall));
        assert!(IfcType::IfcWallStandardCase.is_a(&IfcType::IfcProduct));
        assert!(IfcType::IfcWallStandardCase.is_a(&IfcType::IfcRoot));
        assert!(!IfcType::IfcWall.is_a(&IfcType::IfcWallStandardCase));
        assert!(IfcType::IfcSurfaceStyleRendering.is_a(&IfcType::IfcSurfaceStyleShading));
        assert!(!IfcType::Unknown("IFCTENDON".into()).is_a(&IfcType::IfcRoot));
    }

    #[test]
    fn test_lineage_root_first() {
        let chain = IfcType::IfcSpace.lineage();
        assert_eq!(chain.first(), Some(&IfcType::IfcRoot));
        assert_eq!(chain.last(), Some(&IfcType::IfcSpace));
    }

    #[test]
    fn test_spatial_classification() {
        assert!(IfcType::IfcSpace.is_spatial_enclosure());
        assert!(IfcType::IfcBuildingStorey.is_spatial());
        assert!(IfcType::IfcProject.is_spatial());
        assert!(!IfcType::IfcBuildingStorey.is_spatial_enclosure());
        assert!(!IfcType::IfcWall.is_spatial());
    }

    #[test]
    fn test_named_attribute_access() {
        let wall = entity(
            IfcType::IfcWall,
            vec![
                AttributeValue::String("2O2Fr$t4X7Zf8NOew3FLOH".into()),
                AttributeValue::EntityRef(EntityId(2)),
                AttributeValue::String("Wall-001".into()),
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::EntityRef(EntityId(30)),
                AttributeValue::EntityRef(EntityId(40)),
                AttributeValue::String("T-1".into()),
                AttributeValue::Enum("STANDARD".into()),
            ],
        );

        assert_eq!(wall.global_id(), Some("2O2Fr$t4X7Zf8NOew3FLOH"));
        assert_eq!(wall.name(), Some("Wall-001"));
        assert_eq!(wall.attr("Description"), None);
        assert_eq!(wall.attr_ref("Representation"), Some(EntityId(40)));
        assert_eq!(wall.attr_str("Tag"), Some("T-1"));
        assert_eq!(wall.attr_enum("PredefinedType"), Some("STANDARD"));
        assert_eq!(wall.attr("LongName"), None);
    }

    #[test]
    fn test_attr_refs_accepts_single_and_list() {
        let rel = entity(
            IfcType::IfcRelAggregates,
            vec![
                AttributeValue::String("0Yvctv$4X7Zf8NOew3FLOH".into()),
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::Null,
                AttributeValue::EntityRef(EntityId(1)),
                AttributeValue::List(vec![
                    AttributeValue::EntityRef(EntityId(2)),
                    AttributeValue::EntityRef(EntityId(3)),
                ]),
            ],
        );

        assert_eq!(rel.attr_refs("RelatingObject"), vec![EntityId(1)]);
        assert_eq!(rel.attr_refs("RelatedObjects"), vec![EntityId(2), EntityId(3)]);
    }

    #[test]
    fn test_unknown_rooted_entity_exposes_root_attributes() {
        let tendon = entity(
            IfcType::Unknown("IFCTENDON".into()),
            vec![
                AttributeValue::String("3vB2YO$MX4xv5uCqZZG05x".into()),
                AttributeValue::Null,
                AttributeValue::String("Tendon".into()),
            ],
        );
        assert_eq!(tendon.name(), Some("Tendon"));

        let point = entity(
            IfcType::Unknown("IFCSOMETHING".into()),
            vec![AttributeValue::String("short".into())],
        );
        assert_eq!(point.global_id(), None);
    }

    #[test]
    fn test_typed_value_accessors() {
        let value = AttributeValue::TypedValue(
            "IFCSPECULAREXPONENT".into(),
            vec![AttributeValue::Float(64.0)],
        );
        let (tag, inner) = value.as_typed().unwrap();
        assert_eq!(tag, "IFCSPECULAREXPONENT");
        assert_eq!(inner.as_float(), Some(64.0));
        assert_eq!(value.as_float(), Some(64.0));
    }
}
