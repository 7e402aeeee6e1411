// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute layout of the IFC types the converter reads
//!
//! STEP stores attributes positionally, with a subtype's attributes appended
//! after its supertype's. Each type lists only the attributes it declares;
//! [`attribute_index`] accumulates offsets along [`IfcType::lineage`].
//! The layout covers IFC2X3 and IFC4, which agree on every position read here.

use crate::IfcType;

/// Attributes declared directly on a type, in STEP order
pub fn own_attributes(ifc_type: &IfcType) -> &'static [&'static str] {
    use IfcType::*;
    match ifc_type {
        IfcRoot => &["GlobalId", "OwnerHistory", "Name", "Description"],
        IfcObject => &["ObjectType"],
        IfcContext => &["LongName", "Phase", "RepresentationContexts", "UnitsInContext"],
        IfcProduct => &["ObjectPlacement", "Representation"],
        IfcSpatialElement => &["LongName"],
        IfcSpatialStructureElement => &["CompositionType"],
        IfcSite => &[
            "RefLatitude",
            "RefLongitude",
            "RefElevation",
            "LandTitleNumber",
            "SiteAddress",
        ],
        IfcBuilding => &["ElevationOfRefHeight", "ElevationOfTerrain", "BuildingAddress"],
        IfcBuildingStorey => &["Elevation"],
        IfcSpace => &["PredefinedType", "ElevationWithFlooring"],
        IfcFacility => &["PredefinedType"],
        IfcElement => &["Tag"],
        IfcDoor => &[
            "OverallHeight",
            "OverallWidth",
            "PredefinedType",
            "OperationType",
            "UserDefinedOperationType",
        ],
        IfcWindow => &[
            "OverallHeight",
            "OverallWidth",
            "PredefinedType",
            "PartitioningType",
            "UserDefinedPartitioningType",
        ],
        IfcWall | IfcCurtainWall | IfcSlab | IfcRoof | IfcBeam | IfcColumn | IfcStair
        | IfcStairFlight | IfcRamp | IfcRampFlight | IfcRailing | IfcCovering | IfcPlate
        | IfcMember | IfcFooting | IfcPile | IfcChimney | IfcShadingDevice
        | IfcBuildingElementProxy | IfcOpeningElement | IfcFurniture => &["PredefinedType"],
        IfcElementAssembly => &["AssemblyPlace", "PredefinedType"],

        IfcTypeObject => &["ApplicableOccurrence", "HasPropertySets"],
        IfcTypeProduct => &["RepresentationMaps", "Tag"],
        IfcElementType => &["ElementType"],
        IfcWallType | IfcSlabType | IfcBeamType | IfcColumnType | IfcDoorType
        | IfcWindowType | IfcMemberType | IfcPlateType | IfcCoveringType | IfcRailingType
        | IfcBuildingElementProxyType => &["PredefinedType"],

        IfcRelAggregates | IfcRelNests => &["RelatingObject", "RelatedObjects"],
        IfcRelContainedInSpatialStructure => &["RelatedElements", "RelatingStructure"],
        IfcRelVoidsElement => &["RelatingBuildingElement", "RelatedOpeningElement"],
        IfcRelFillsElement => &["RelatingOpeningElement", "RelatedBuildingElement"],
        IfcRelSpaceBoundary => &[
            "RelatingSpace",
            "RelatedBuildingElement",
            "ConnectionGeometry",
            "PhysicalOrVirtualBoundary",
            "InternalOrExternalBoundary",
        ],
        IfcRelAssociates => &["RelatedObjects"],
        IfcRelAssociatesMaterial => &["RelatingMaterial"],
        IfcRelAssociatesClassification => &["RelatingClassification"],
        IfcRelDefinesByProperties => &["RelatedObjects", "RelatingPropertyDefinition"],
        IfcRelDefinesByType => &["RelatedObjects", "RelatingType"],

        IfcPropertySet => &["HasProperties"],
        IfcElementQuantity => &["MethodOfMeasurement", "Quantities"],
        IfcProperty => &["Name", "Description"],
        IfcPropertySingleValue => &["NominalValue", "Unit"],
        IfcPropertyEnumeratedValue => &["EnumerationValues", "EnumerationReference"],
        IfcPropertyListValue => &["ListValues", "Unit"],
        IfcPropertyBoundedValue => &["UpperBoundValue", "LowerBoundValue", "Unit"],

        IfcMaterial => &["Name", "Description", "Category"],
        IfcMaterialList => &["Materials"],
        IfcMaterialLayer => &[
            "Material",
            "LayerThickness",
            "IsVentilated",
            "Name",
            "Description",
            "Category",
            "Priority",
        ],
        IfcMaterialLayerSet => &["MaterialLayers", "LayerSetName", "Description"],
        IfcMaterialLayerSetUsage => &[
            "ForLayerSet",
            "LayerSetDirection",
            "DirectionSense",
            "OffsetFromReferenceLine",
            "ReferenceExtent",
        ],
        IfcMaterialProfile => &[
            "Name",
            "Description",
            "Material",
            "Profile",
            "Priority",
            "Category",
        ],
        IfcMaterialProfileSet => &["Name", "Description", "MaterialProfiles", "CompositeProfile"],
        IfcMaterialProfileSetUsage => &["ForProfileSet", "CardinalPoint", "ReferenceExtent"],
        IfcMaterialConstituent => &["Name", "Description", "Material", "Fraction", "Category"],
        IfcMaterialConstituentSet => &["Name", "Description", "MaterialConstituents"],

        IfcProductRepresentation => &["Name", "Description", "Representations"],
        IfcMaterialDefinitionRepresentation => &["RepresentedMaterial"],
        IfcRepresentation => &[
            "ContextOfItems",
            "RepresentationIdentifier",
            "RepresentationType",
            "Items",
        ],
        IfcRepresentationMap => &["MappingOrigin", "MappedRepresentation"],
        IfcMappedItem => &["MappingSource", "MappingTarget"],
        IfcStyledItem => &["Item", "Styles", "Name"],

        IfcCartesianPoint => &["Coordinates"],
        IfcDirection => &["DirectionRatios"],
        IfcPlacement => &["Location"],
        IfcAxis2Placement2D => &["RefDirection"],
        IfcAxis2Placement3D => &["Axis", "RefDirection"],
        IfcCartesianTransformationOperator => &["Axis1", "Axis2", "LocalOrigin", "Scale"],
        IfcCartesianTransformationOperator3D => &["Axis3"],
        IfcCartesianTransformationOperator3DnonUniform => &["Scale2", "Scale3"],
        IfcCartesianPointList3D | IfcCartesianPointList2D => &["CoordList"],
        IfcPolyline => &["Points"],
        IfcIndexedPolyCurve => &["Points", "Segments", "SelfIntersect"],
        IfcExtrudedAreaSolid => &["SweptArea", "Position", "ExtrudedDirection", "Depth"],
        IfcTriangulatedFaceSet => &["Coordinates", "Normals", "Closed", "CoordIndex", "PnIndex"],
        IfcPolygonalFaceSet => &["Coordinates", "Closed", "Faces", "PnIndex"],
        IfcIndexedPolygonalFace => &["CoordIndex"],
        IfcFacetedBrep => &["Outer"],
        IfcClosedShell => &["CfsFaces"],
        IfcFace => &["Bounds"],
        IfcFaceBound => &["Bound", "Orientation"],
        IfcPolyLoop => &["Polygon"],
        IfcBooleanResult => &["Operator", "FirstOperand", "SecondOperand"],
        IfcProfileDef => &["ProfileType", "ProfileName"],
        IfcParameterizedProfileDef => &["Position"],
        IfcRectangleProfileDef => &["XDim", "YDim"],
        IfcCircleProfileDef => &["Radius"],
        IfcCircleHollowProfileDef => &["WallThickness"],
        IfcArbitraryClosedProfileDef => &["OuterCurve"],
        IfcArbitraryProfileDefWithVoids => &["InnerCurves"],
        IfcLocalPlacement => &["PlacementRelTo", "RelativePlacement"],

        IfcPresentationStyle => &["Name"],
        IfcSurfaceStyle => &["Side", "Styles"],
        IfcPresentationStyleAssignment => &["Styles"],
        IfcSurfaceStyleShading => &["SurfaceColour", "Transparency"],
        IfcSurfaceStyleRendering => &[
            "DiffuseColour",
            "TransmissionColour",
            "DiffuseTransmissionColour",
            "ReflectionColour",
            "SpecularColour",
            "SpecularHighlight",
            "ReflectanceMethod",
        ],
        IfcColourSpecification => &["Name"],
        IfcColourRgb => &["Red", "Green", "Blue"],
        IfcPresentationLayerAssignment => &["Name", "Description", "AssignedItems", "Identifier"],
        IfcPresentationLayerWithStyle => &["LayerOn", "LayerFrozen", "LayerBlocked", "LayerStyles"],

        IfcExternalReference => &["Location", "Identification", "Name"],
        IfcClassificationReference => &["ReferencedSource", "Description", "Sort"],
        IfcClassification => &[
            "Source",
            "Edition",
            "EditionDate",
            "Name",
            "Description",
            "Location",
            "ReferenceTokens",
        ],

        IfcOwnerHistory => &[
            "OwningUser",
            "OwningApplication",
            "State",
            "ChangeAction",
            "LastModifiedDate",
            "LastModifyingUser",
            "LastModifyingApplication",
            "CreationDate",
        ],
        IfcPersonAndOrganization => &["ThePerson", "TheOrganization", "Roles"],
        IfcPerson => &[
            "Identification",
            "FamilyName",
            "GivenName",
            "MiddleNames",
            "PrefixTitles",
            "SuffixTitles",
            "Roles",
            "Addresses",
        ],
        IfcOrganization => &["Identification", "Name", "Description", "Roles", "Addresses"],
        IfcActorRole => &["Role", "UserDefinedRole", "Description"],
        IfcApplication => &[
            "ApplicationDeveloper",
            "Version",
            "ApplicationFullName",
            "ApplicationIdentifier",
        ],

        IfcUnitAssignment => &["Units"],
        IfcNamedUnit => &["Dimensions", "UnitType"],
        IfcSIUnit => &["Prefix", "Name"],
        IfcConversionBasedUnit => &["Name", "ConversionFactor"],
        IfcMeasureWithUnit => &["ValueComponent", "UnitComponent"],

        _ => &[],
    }
}

/// Map an attribute name used by another schema generation onto the one listed here
pub fn canonical_attribute(name: &str) -> &str {
    match name {
        "Id" | "ItemReference" => "Identification",
        "InteriorOrExteriorSpace" => "PredefinedType",
        other => other,
    }
}

/// Position of a named attribute within a type's full STEP attribute list
pub fn attribute_index(ifc_type: &IfcType, name: &str) -> Option<usize> {
    let name = canonical_attribute(name);
    let mut offset = 0;
    for ty in ifc_type.lineage() {
        let own = own_attributes(&ty);
        if let Some(position) = own.iter().position(|attr| *attr == name) {
            return Some(offset + position);
        }
        offset += own.len();
    }
    None
}

/// An inverse attribute: the named back-reference set an entity receives from
/// every `relation` entity whose `forward` attribute points at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InverseLink {
    pub name: &'static str,
    pub relation: &'static str,
    pub forward: &'static str,
}

const fn link(name: &'static str, relation: &'static str, forward: &'static str) -> InverseLink {
    InverseLink {
        name,
        relation,
        forward,
    }
}

/// Inverse attributes indexed at load time
pub const INVERSE_LINKS: &[InverseLink] = &[
    link("HasAssociations", "IfcRelAssociates", "RelatedObjects"),
    link("AssociatedTo", "IfcRelAssociatesMaterial", "RelatingMaterial"),
    link("IsDefinedBy", "IfcRelDefinesByProperties", "RelatedObjects"),
    link("IsTypedBy", "IfcRelDefinesByType", "RelatedObjects"),
    link("Types", "IfcRelDefinesByType", "RelatingType"),
    link("ContainsElements", "IfcRelContainedInSpatialStructure", "RelatingStructure"),
    link("ContainedInStructure", "IfcRelContainedInSpatialStructure", "RelatedElements"),
    link("IsDecomposedBy", "IfcRelAggregates", "RelatingObject"),
    link("Decomposes", "IfcRelAggregates", "RelatedObjects"),
    link("HasOpenings", "IfcRelVoidsElement", "RelatingBuildingElement"),
    link("VoidsElements", "IfcRelVoidsElement", "RelatedOpeningElement"),
    link("FillsVoids", "IfcRelFillsElement", "RelatedBuildingElement"),
    link("HasFillings", "IfcRelFillsElement", "RelatingOpeningElement"),
    link("StyledByItem", "IfcStyledItem", "Item"),
    link("LayerAssignment", "IfcPresentationLayerAssignment", "AssignedItems"),
    link("HasRepresentation", "IfcMaterialDefinitionRepresentation", "RepresentedMaterial"),
];

/// Map an inverse name used by another schema generation onto the indexed one
pub fn canonical_inverse(name: &str) -> &str {
    match name {
        "LayerAssignments" => "LayerAssignment",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_product_positions() {
        assert_eq!(attribute_index(&IfcType::IfcWall, "GlobalId"), Some(0));
        assert_eq!(attribute_index(&IfcType::IfcWall, "ObjectPlacement"), Some(5));
        assert_eq!(attribute_index(&IfcType::IfcWall, "Representation"), Some(6));
        assert_eq!(attribute_index(&IfcType::IfcWall, "PredefinedType"), Some(8));
        assert_eq!(attribute_index(&IfcType::IfcWallStandardCase, "PredefinedType"), Some(8));
    }

    #[test]
    fn test_spatial_positions() {
        assert_eq!(attribute_index(&IfcType::IfcBuildingStorey, "LongName"), Some(7));
        assert_eq!(attribute_index(&IfcType::IfcBuildingStorey, "Elevation"), Some(9));
        assert_eq!(attribute_index(&IfcType::IfcSite, "RefElevation"), Some(11));
        assert_eq!(attribute_index(&IfcType::IfcProject, "UnitsInContext"), Some(8));
        assert_eq!(attribute_index(&IfcType::IfcSpace, "InteriorOrExteriorSpace"), Some(9));
    }

    #[test]
    fn test_relationship_positions() {
        assert_eq!(attribute_index(&IfcType::IfcRelAggregates, "RelatedObjects"), Some(5));
        assert_eq!(
            attribute_index(&IfcType::IfcRelContainedInSpatialStructure, "RelatingStructure"),
            Some(5)
        );
        assert_eq!(
            attribute_index(&IfcType::IfcRelAssociatesMaterial, "RelatingMaterial"),
            Some(5)
        );
        assert_eq!(
            attribute_index(&IfcType::IfcRelDefinesByProperties, "RelatingPropertyDefinition"),
            Some(5)
        );
    }

    #[test]
    fn test_presentation_positions() {
        assert_eq!(attribute_index(&IfcType::IfcSurfaceStyle, "Styles"), Some(2));
        assert_eq!(attribute_index(&IfcType::IfcSurfaceStyleRendering, "Transparency"), Some(1));
        assert_eq!(
            attribute_index(&IfcType::IfcSurfaceStyleRendering, "SpecularHighlight"),
            Some(7)
        );
        assert_eq!(
            attribute_index(&IfcType::IfcSurfaceStyleRendering, "ReflectanceMethod"),
            Some(8)
        );
        assert_eq!(attribute_index(&IfcType::IfcSurfaceStyleShading, "DiffuseColour"), None);
        assert_eq!(attribute_index(&IfcType::IfcColourRgb, "Blue"), Some(3));
        assert_eq!(
            attribute_index(&IfcType::IfcMaterialDefinitionRepresentation, "RepresentedMaterial"),
            Some(3)
        );
        assert_eq!(attribute_index(&IfcType::IfcStyledRepresentation, "Items"), Some(3));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(attribute_index(&IfcType::IfcPerson, "Id"), Some(0));
        assert_eq!(attribute_index(&IfcType::IfcOrganization, "Id"), Some(0));
        assert_eq!(
            attribute_index(&IfcType::IfcClassificationReference, "ItemReference"),
            Some(1)
        );
        assert_eq!(canonical_inverse("LayerAssignments"), "LayerAssignment");
    }

    #[test]
    fn test_inverse_relations_are_known_types() {
        for link in INVERSE_LINKS {
            let relation = IfcType::parse(link.relation);
            assert!(!matches!(relation, IfcType::Unknown(_)), "{}", link.relation);
            assert!(
                attribute_index(&relation, link.forward).is_some(),
                "{}.{}",
                link.relation,
                link.forward
            );
        }
    }
}
