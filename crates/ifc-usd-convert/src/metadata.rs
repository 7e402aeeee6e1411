// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metadata extraction
//!
//! Each record is built independently and tolerates missing data: an
//! attribute or relation that cannot be read is left out of the record.

use crate::scalarize::scalarize;
use chrono::{DateTime, Utc};
use ifc_usd_model::{
    DecodedEntity, EntityResolver, EntityResolverExt, IfcType, MetadataMap, MetadataValue,
};
use std::sync::Arc;

/// Attributes copied into the identity record when a type has no entry below
const DEFAULT_IDENTITY: &[&str] = &["GlobalId", "Name"];

/// Identity attributes per type; the most specific listed supertype applies
const IDENTITY_ATTRIBUTES: &[(IfcType, &[&str])] = &[
    (
        IfcType::IfcProject,
        &["GlobalId", "Name", "Description", "LongName", "Phase"],
    ),
    (
        IfcType::IfcSite,
        &["GlobalId", "Name", "Description", "LongName", "RefElevation", "LandTitleNumber"],
    ),
    (
        IfcType::IfcBuilding,
        &[
            "GlobalId",
            "Name",
            "Description",
            "LongName",
            "ElevationOfRefHeight",
            "ElevationOfTerrain",
        ],
    ),
    (
        IfcType::IfcBuildingStorey,
        &["GlobalId", "Name", "Description", "LongName", "Elevation"],
    ),
    (
        IfcType::IfcSpace,
        &[
            "GlobalId",
            "Name",
            "Description",
            "LongName",
            "PredefinedType",
            "ElevationWithFlooring",
        ],
    ),
    (
        IfcType::IfcDoor,
        &[
            "GlobalId",
            "Name",
            "Description",
            "ObjectType",
            "Tag",
            "OverallHeight",
            "OverallWidth",
            "PredefinedType",
        ],
    ),
    (
        IfcType::IfcWindow,
        &[
            "GlobalId",
            "Name",
            "Description",
            "ObjectType",
            "Tag",
            "OverallHeight",
            "OverallWidth",
            "PredefinedType",
        ],
    ),
    (
        IfcType::IfcElement,
        &["GlobalId", "Name", "Description", "ObjectType", "Tag", "PredefinedType"],
    ),
];

/// Relationship table: (inverse attribute, role, attribute holding the target)
const RELATIONSHIPS: &[(&str, &str, &str)] = &[
    ("HasOpenings", "Opening", "RelatedOpeningElement"),
    ("FillsVoids", "FillsOpening", "RelatingOpeningElement"),
    ("ContainedInStructure", "ContainedIn", "RelatingStructure"),
    ("Decomposes", "PartOf", "RelatingObject"),
    ("IsDecomposedBy", "HasPart", "RelatedObjects"),
];

/// Attribute allow-list for a type
pub fn identity_attributes(ifc_type: &IfcType) -> &'static [&'static str] {
    ifc_type
        .lineage()
        .iter()
        .rev()
        .find_map(|ty| {
            IDENTITY_ATTRIBUTES
                .iter()
                .find(|(listed, _)| listed == ty)
                .map(|(_, attributes)| *attributes)
        })
        .unwrap_or(DEFAULT_IDENTITY)
}

/// Builds the metadata records attached to every node
pub struct MetadataExtractor<'a> {
    resolver: &'a dyn EntityResolver,
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(resolver: &'a dyn EntityResolver) -> Self {
        Self { resolver }
    }

    /// Allow-listed scalar attributes plus a `Classifications` mapping
    pub fn identity_and_classification(&self, entity: &DecodedEntity) -> MetadataMap {
        let mut record = MetadataMap::new();
        for &name in identity_attributes(&entity.ifc_type) {
            let value = entity
                .attr(name)
                .filter(|v| v.as_entity_ref().is_none())
                .and_then(scalarize);
            if let Some(value) = value {
                record.insert(name.to_string(), value);
            }
        }

        let classifications = self.classifications(entity);
        if !classifications.is_empty() {
            record.insert("Classifications".into(), classifications.into());
        }
        record
    }

    fn classifications(&self, entity: &DecodedEntity) -> MetadataMap {
        let mut classifications = MetadataMap::new();
        let associations = self.resolver.inverse_of(entity, "HasAssociations");
        let references = associations
            .iter()
            .filter(|rel| rel.ifc_type == IfcType::IfcRelAssociatesClassification)
            .filter_map(|rel| self.resolver.attr_entity(rel, "RelatingClassification"));

        for reference in references {
            let mut entry = MetadataMap::new();
            copy_string(&reference, "Identification", &mut entry);
            copy_string(&reference, "Name", &mut entry);
            copy_string(&reference, "Location", &mut entry);
            copy_string(&reference, "Edition", &mut entry);

            let source = match reference.ifc_type {
                IfcType::IfcClassification => reference.attr_str("Source").map(str::to_string),
                _ => self
                    .resolver
                    .attr_entity(&reference, "ReferencedSource")
                    .and_then(|source| source.name().map(str::to_string)),
            };
            if let Some(source) = source {
                entry.insert("Source".into(), source.into());
            }

            let key = reference
                .attr_str("Identification")
                .or_else(|| reference.name())
                .map(str::to_string)
                .unwrap_or_else(|| reference.id.to_string());
            classifications.insert(key, entry.into());
        }
        classifications
    }

    /// `set name -> {property name -> value}` for property sets only
    pub fn property_sets(&self, entity: &DecodedEntity) -> MetadataMap {
        let mut sets = MetadataMap::new();
        for rel in self.resolver.inverse_of(entity, "IsDefinedBy") {
            let Some(pset) = self
                .resolver
                .attr_entity(&rel, "RelatingPropertyDefinition")
                .filter(|d| d.ifc_type == IfcType::IfcPropertySet)
            else {
                continue;
            };

            let mut properties = MetadataMap::new();
            for property in self.resolver.attr_entities(&pset, "HasProperties") {
                let value = property.attr("NominalValue").and_then(scalarize);
                if let (Some(name), Some(value)) = (property.name(), value) {
                    properties.insert(name.to_string(), value);
                }
            }
            if properties.is_empty() {
                continue;
            }

            let name = pset
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("PropertySet_{}", pset.id.0));
            match sets.get_mut(&name) {
                // Same-named sets from several relations merge
                Some(MetadataValue::Map(existing)) => existing.extend(properties),
                _ => {
                    sets.insert(name, properties.into());
                }
            }
        }
        sets
    }

    /// One entry per related entity, keyed `{RelationType}_{targetGlobalId}`
    pub fn relationships(&self, entity: &DecodedEntity) -> MetadataMap {
        let mut relationships = MetadataMap::new();
        for &(inverse, role, target_attribute) in RELATIONSHIPS {
            for rel in self.resolver.inverse_of(entity, inverse) {
                for target in self.resolver.attr_entities(&rel, target_attribute) {
                    let target_id = target
                        .global_id()
                        .map(str::to_string)
                        .unwrap_or_else(|| target.id.0.to_string());

                    let mut entry = MetadataMap::new();
                    entry.insert("role".into(), role.into());
                    entry.insert("targetType".into(), target.ifc_type.name().into());
                    entry.insert("targetGlobalId".into(), target_id.clone().into());
                    relationships.insert(
                        format!("{}_{}", rel.ifc_type.name(), target_id),
                        entry.into(),
                    );
                }
            }
        }
        relationships
    }

    /// Ownership and authoring data from `OwnerHistory`
    pub fn provenance(&self, entity: &DecodedEntity) -> Option<MetadataMap> {
        self.provenance_at(entity, Utc::now())
    }

    /// [`Self::provenance`] with `now` standing in for a missing creation date
    pub fn provenance_at(&self, entity: &DecodedEntity, now: DateTime<Utc>) -> Option<MetadataMap> {
        let history = self.resolver.attr_entity(entity, "OwnerHistory")?;
        let mut info = MetadataMap::new();

        if let Some(action) = history.attr_enum("ChangeAction") {
            info.insert("changeAction".into(), action.into());
        }

        let created = history
            .attr("CreationDate")
            .and_then(|v| v.as_integer())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or(now);
        info.insert("creationDate".into(), created.timestamp().into());
        info.insert("creationDateIso".into(), created.to_rfc3339().into());

        if let Some(application) = self.resolver.attr_entity(&history, "OwningApplication") {
            copy_string_as(&application, "ApplicationFullName", "application", &mut info);
            copy_string_as(&application, "Version", "applicationVersion", &mut info);
        }

        if let Some(user) = self.resolver.attr_entity(&history, "OwningUser") {
            self.owning_user(&user, &mut info);
        }

        Some(info)
    }

    fn owning_user(&self, user: &DecodedEntity, info: &mut MetadataMap) {
        let person = self.resolver.attr_entity(user, "ThePerson");
        if let Some(person) = &person {
            copy_string_as(person, "Identification", "personId", info);
            let full_name = [person.attr_str("GivenName"), person.attr_str("FamilyName")]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            let full_name = full_name.trim();
            if !full_name.is_empty() {
                info.insert("personName".into(), full_name.into());
            }
        }

        if let Some(organization) = self.resolver.attr_entity(user, "TheOrganization") {
            copy_string_as(&organization, "Identification", "organizationId", info);
            copy_string_as(&organization, "Name", "organizationName", info);
        }

        let mut roles = role_names(&self.resolver.attr_entities(user, "Roles"));
        if roles.is_empty() {
            if let Some(person) = &person {
                roles = role_names(&self.resolver.attr_entities(person, "Roles"));
            }
        }
        if !roles.is_empty() {
            info.insert("roles".into(), roles.join(", ").into());
        }
    }

    /// `layer name -> {Name, Description, Identifier}` for the element's shape
    ///
    /// Layers assigned to whole representations come before those assigned
    /// to their items.
    pub fn presentation_layers(&self, entity: &DecodedEntity) -> MetadataMap {
        let mut layers = MetadataMap::new();
        let Some(shape) = self.resolver.attr_entity(entity, "Representation") else {
            return layers;
        };

        for representation in self.resolver.attr_entities(&shape, "Representations") {
            let mut assignments = self.resolver.inverse_of(&representation, "LayerAssignment");
            for item in self.resolver.attr_entities(&representation, "Items") {
                assignments.extend(self.resolver.inverse_of(&item, "LayerAssignment"));
            }
            for layer in assignments {
                add_layer(&layer, &mut layers);
            }
        }
        layers
    }
}

fn add_layer(layer: &Arc<DecodedEntity>, layers: &mut MetadataMap) {
    let Some(name) = layer.name() else {
        return;
    };
    if layers.contains_key(name) {
        return;
    }
    let mut entry = MetadataMap::new();
    entry.insert("name".into(), name.into());
    if let Some(description) = layer.attr_str("Description") {
        entry.insert("description".into(), description.into());
    }
    if let Some(identifier) = layer.attr_str("Identifier") {
        entry.insert("identifier".into(), identifier.into());
    }
    layers.insert(name.to_string(), entry.into());
}

fn role_names(roles: &[Arc<DecodedEntity>]) -> Vec<String> {
    roles
        .iter()
        .filter_map(|role| match role.attr_enum("Role") {
            Some("USERDEFINED") | None => role.attr_str("UserDefinedRole").map(str::to_string),
            Some(role) => Some(role.to_string()),
        })
        .collect()
}

fn copy_string(entity: &DecodedEntity, attribute: &str, record: &mut MetadataMap) {
    copy_string_as(entity, attribute, attribute, record);
}

fn copy_string_as(entity: &DecodedEntity, attribute: &str, key: &str, record: &mut MetadataMap) {
    if let Some(value) = entity.attr_str(attribute).filter(|v| !v.is_empty()) {
        record.insert(key.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_usd_model::EntityId;
    use ifc_usd_parser::ResolverImpl;

    const BUILDING: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('house.ifc','2024-03-01T10:00:00',('Architect'),('Studio'),'','Modeler','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPERSON('jd','Doe','Jane',$,$,$,$,$);
#2=IFCORGANIZATION('ORG-1','Studio North',$,$,$);
#3=IFCACTORROLE(.ARCHITECT.,$,$);
#4=IFCACTORROLE(.USERDEFINED.,'BIM Coordinator',$);
#5=IFCPERSONANDORGANIZATION(#1,#2,(#3,#4));
#6=IFCAPPLICATION(#2,'2024.1','Modeler Pro','MP');
#7=IFCOWNERHISTORY(#5,#6,$,.ADDED.,$,$,$,1700000000);
#8=IFCOWNERHISTORY(#5,#6,$,.NOCHANGE.,$,$,$,$);
#10=IFCBUILDINGSTOREY('0aaaaaaaaaaaaaaaaaaaaa',#7,'Level 1',$,$,$,$,'First floor',.ELEMENT.,3.2);
#11=IFCWALL('0bbbbbbbbbbbbbbbbbbbbb',#8,'Wall-01','Exterior',$,$,#30,'W1',.SOLIDWALL.);
#12=IFCRELCONTAINEDINSPATIALSTRUCTURE('0ccccccccccccccccccccc',$,$,$,(#11),#10);
#13=IFCOPENINGELEMENT('0ddddddddddddddddddddd',$,'Opening',$,$,$,$,$,.OPENING.);
#14=IFCRELVOIDSELEMENT('0eeeeeeeeeeeeeeeeeeeee',$,$,$,#11,#13);
#15=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#16=IFCPROPERTYSINGLEVALUE('ThermalTransmittance',$,IFCTHERMALTRANSMITTANCEMEASURE(0.24),$);
#17=IFCPROPERTYSINGLEVALUE('Reference',$,$,$);
#18=IFCPROPERTYSET('0fffffffffffffffffffff',$,'Pset_WallCommon',$,(#15,#16,#17));
#19=IFCRELDEFINESBYPROPERTIES('0ggggggggggggggggggggg',$,$,$,(#11),#18);
#20=IFCQUANTITYLENGTH('Length',$,$,5.,$);
#21=IFCELEMENTQUANTITY('0hhhhhhhhhhhhhhhhhhhhh',$,'Qto_WallBaseQuantities',$,$,(#20));
#22=IFCRELDEFINESBYPROPERTIES('0iiiiiiiiiiiiiiiiiiiii',$,$,$,(#11),#21);
#23=IFCCLASSIFICATION('CSI','2004',$,'Uniformat',$,$,$);
#24=IFCCLASSIFICATIONREFERENCE($,'B2010','Exterior Walls',#23,$,$);
#25=IFCRELASSOCIATESCLASSIFICATION('0jjjjjjjjjjjjjjjjjjjjj',$,$,$,(#11),#24);
#30=IFCPRODUCTDEFINITIONSHAPE($,$,(#31));
#31=IFCSHAPEREPRESENTATION(#99,'Body','SweptSolid',(#32));
#32=IFCEXTRUDEDAREASOLID(#98,$,#97,3.);
#33=IFCPRESENTATIONLAYERASSIGNMENT('A-WALL','Walls',(#31),'L1');
#34=IFCPRESENTATIONLAYERASSIGNMENT('A-WALL',$,(#32),$);
#35=IFCPRESENTATIONLAYERASSIGNMENT('A-STRUCT',$,(#32),$);
#40=IFCBUILDINGELEMENTPROXY('0kkkkkkkkkkkkkkkkkkkkk',$,$,$,$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    fn setup() -> ResolverImpl {
        ResolverImpl::new(BUILDING.to_string())
    }

    fn entity(resolver: &ResolverImpl, id: u32) -> Arc<DecodedEntity> {
        resolver.get(EntityId(id)).unwrap()
    }

    fn nested<'m>(map: &'m MetadataMap, key: &str) -> &'m MetadataMap {
        map.get(key).and_then(|v| v.as_map()).unwrap()
    }

    #[test]
    fn test_identity_allow_list() {
        assert_eq!(identity_attributes(&IfcType::IfcWallStandardCase), identity_attributes(&IfcType::IfcWall));
        assert!(identity_attributes(&IfcType::IfcDoor).contains(&"OverallWidth"));
        assert_eq!(identity_attributes(&IfcType::IfcRelAggregates), DEFAULT_IDENTITY);
    }

    #[test]
    fn test_identity_record() {
        let resolver = setup();
        let extractor = MetadataExtractor::new(&resolver);

        let storey = extractor.identity_and_classification(&entity(&resolver, 10));
        assert_eq!(storey.get("Name"), Some(&MetadataValue::String("Level 1".into())));
        assert_eq!(storey.get("LongName"), Some(&MetadataValue::String("First floor".into())));
        assert_eq!(storey.get("Elevation"), Some(&MetadataValue::Float(3.2)));
        assert!(storey.get("Description").is_none());

        let wall = extractor.identity_and_classification(&entity(&resolver, 11));
        let keys: Vec<&str> = wall.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["GlobalId", "Name", "Description", "Tag", "PredefinedType", "Classifications"]
        );

        let classification = nested(nested(&wall, "Classifications"), "B2010");
        assert_eq!(classification.get("Name"), Some(&"Exterior Walls".into()));
        assert_eq!(classification.get("Source"), Some(&"Uniformat".into()));
    }

    #[test]
    fn test_property_sets_skip_quantities_and_empty_values() {
        let resolver = setup();
        let extractor = MetadataExtractor::new(&resolver);

        let sets = extractor.property_sets(&entity(&resolver, 11));
        assert_eq!(sets.len(), 1);
        let common = nested(&sets, "Pset_WallCommon");
        assert_eq!(common.get("IsExternal"), Some(&MetadataValue::Bool(true)));
        assert_eq!(common.get("ThermalTransmittance"), Some(&MetadataValue::Float(0.24)));
        assert!(common.get("Reference").is_none());
    }

    #[test]
    fn test_relationships() {
        let resolver = setup();
        let extractor = MetadataExtractor::new(&resolver);

        let wall = extractor.relationships(&entity(&resolver, 11));
        assert_eq!(wall.len(), 2);
        let opening = nested(&wall, "IfcRelVoidsElement_0ddddddddddddddddddddd");
        assert_eq!(opening.get("role"), Some(&"Opening".into()));
        assert_eq!(opening.get("targetType"), Some(&"IfcOpeningElement".into()));
        let container = nested(&wall, "IfcRelContainedInSpatialStructure_0aaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(container.get("role"), Some(&"ContainedIn".into()));

        assert!(extractor.relationships(&entity(&resolver, 40)).is_empty());
    }

    #[test]
    fn test_provenance() {
        let resolver = setup();
        let extractor = MetadataExtractor::new(&resolver);

        let info = extractor.provenance(&entity(&resolver, 10)).unwrap();
        assert_eq!(info.get("changeAction"), Some(&"ADDED".into()));
        assert_eq!(info.get("creationDate"), Some(&MetadataValue::Int(1_700_000_000)));
        assert_eq!(info.get("creationDateIso"), Some(&"2023-11-14T22:13:20+00:00".into()));
        assert_eq!(info.get("application"), Some(&"Modeler Pro".into()));
        assert_eq!(info.get("applicationVersion"), Some(&"2024.1".into()));
        assert_eq!(info.get("personId"), Some(&"jd".into()));
        assert_eq!(info.get("personName"), Some(&"Jane Doe".into()));
        assert_eq!(info.get("organizationId"), Some(&"ORG-1".into()));
        assert_eq!(info.get("organizationName"), Some(&"Studio North".into()));
        assert_eq!(info.get("roles"), Some(&"ARCHITECT, BIM Coordinator".into()));

        assert!(extractor.provenance(&entity(&resolver, 40)).is_none());
    }

    #[test]
    fn test_provenance_without_creation_date_uses_now() {
        let resolver = setup();
        let extractor = MetadataExtractor::new(&resolver);
        let now = DateTime::<Utc>::from_timestamp(1_234_567_890, 0).unwrap();

        let info = extractor.provenance_at(&entity(&resolver, 11), now).unwrap();
        assert_eq!(info.get("creationDate"), Some(&MetadataValue::Int(1_234_567_890)));
        assert_eq!(info.get("changeAction"), Some(&"NOCHANGE".into()));
    }

    #[test]
    fn test_presentation_layers_are_deduplicated() {
        let resolver = setup();
        let extractor = MetadataExtractor::new(&resolver);

        let layers = extractor.presentation_layers(&entity(&resolver, 11));
        let names: Vec<&str> = layers.keys().map(String::as_str).collect();
        assert_eq!(names, ["A-WALL", "A-STRUCT"]);

        let wall_layer = nested(&layers, "A-WALL");
        assert_eq!(wall_layer.get("description"), Some(&"Walls".into()));
        assert_eq!(wall_layer.get("identifier"), Some(&"L1".into()));
    }
}
