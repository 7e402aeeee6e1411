// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Material containers: the shapes a material association can take

use ifc_usd_model::{DecodedEntity, EntityResolver, EntityResolverExt, IfcType};
use std::sync::Arc;

/// What an `IfcRelAssociatesMaterial` points at
///
/// Each variant resolves to concrete `IfcMaterial` entities in source order.
/// Usages resolve through their set, sets through their members, so
/// resolution always ends.
#[derive(Clone, Debug)]
pub enum MaterialContainer {
    Material(Arc<DecodedEntity>),
    List(Arc<DecodedEntity>),
    LayerSet(Arc<DecodedEntity>),
    LayerSetUsage(Arc<DecodedEntity>),
    ProfileSet(Arc<DecodedEntity>),
    ProfileSetUsage(Arc<DecodedEntity>),
    ConstituentSet(Arc<DecodedEntity>),
}

impl MaterialContainer {
    /// Classify a material select
    ///
    /// A single layer, profile or constituent stands for the material it wraps.
    pub fn from_entity(entity: Arc<DecodedEntity>, resolver: &dyn EntityResolver) -> Option<Self> {
        let container = match entity.ifc_type {
            IfcType::IfcMaterial => MaterialContainer::Material(entity),
            IfcType::IfcMaterialList => MaterialContainer::List(entity),
            IfcType::IfcMaterialLayerSet => MaterialContainer::LayerSet(entity),
            IfcType::IfcMaterialLayerSetUsage => MaterialContainer::LayerSetUsage(entity),
            IfcType::IfcMaterialProfileSet => MaterialContainer::ProfileSet(entity),
            IfcType::IfcMaterialProfileSetUsage => MaterialContainer::ProfileSetUsage(entity),
            IfcType::IfcMaterialConstituentSet => MaterialContainer::ConstituentSet(entity),
            IfcType::IfcMaterialLayer
            | IfcType::IfcMaterialProfile
            | IfcType::IfcMaterialConstituent => {
                let material = resolver.attr_entity(&entity, "Material")?;
                MaterialContainer::Material(material)
            }
            _ => return None,
        };
        Some(container)
    }

    /// Material associated with an element, or failing that with its type
    pub fn for_element(element: &DecodedEntity, resolver: &dyn EntityResolver) -> Option<Self> {
        Self::associated(element, resolver).or_else(|| {
            resolver
                .inverse_of(element, "IsTypedBy")
                .iter()
                .filter_map(|rel| resolver.attr_entity(rel, "RelatingType"))
                .find_map(|element_type| Self::associated(&element_type, resolver))
        })
    }

    // First material association on the entity itself
    fn associated(entity: &DecodedEntity, resolver: &dyn EntityResolver) -> Option<Self> {
        resolver
            .inverse_of(entity, "HasAssociations")
            .iter()
            .filter(|rel| rel.ifc_type == IfcType::IfcRelAssociatesMaterial)
            .find_map(|rel| {
                let material = resolver.attr_entity(rel, "RelatingMaterial")?;
                Self::from_entity(material, resolver)
            })
    }

    /// The container entity itself
    pub fn entity(&self) -> &Arc<DecodedEntity> {
        match self {
            MaterialContainer::Material(e)
            | MaterialContainer::List(e)
            | MaterialContainer::LayerSet(e)
            | MaterialContainer::LayerSetUsage(e)
            | MaterialContainer::ProfileSet(e)
            | MaterialContainer::ProfileSetUsage(e)
            | MaterialContainer::ConstituentSet(e) => e,
        }
    }

    /// Underlying single materials in source order
    pub fn materials(&self, resolver: &dyn EntityResolver) -> Vec<Arc<DecodedEntity>> {
        let members = |set: &DecodedEntity, attribute: &str| -> Vec<Arc<DecodedEntity>> {
            resolver
                .attr_entities(set, attribute)
                .iter()
                .filter_map(|member| resolver.attr_entity(member, "Material"))
                .filter(|m| m.ifc_type == IfcType::IfcMaterial)
                .collect()
        };

        match self {
            MaterialContainer::Material(material) => vec![Arc::clone(material)],
            MaterialContainer::List(list) => resolver
                .attr_entities(list, "Materials")
                .into_iter()
                .filter(|m| m.ifc_type == IfcType::IfcMaterial)
                .collect(),
            MaterialContainer::LayerSet(set) => members(set, "MaterialLayers"),
            MaterialContainer::ProfileSet(set) => members(set, "MaterialProfiles"),
            MaterialContainer::ConstituentSet(set) => members(set, "MaterialConstituents"),
            MaterialContainer::LayerSetUsage(usage) => resolver
                .attr_entity(usage, "ForLayerSet")
                .map(|set| MaterialContainer::LayerSet(set).materials(resolver))
                .unwrap_or_default(),
            MaterialContainer::ProfileSetUsage(usage) => resolver
                .attr_entity(usage, "ForProfileSet")
                .map(|set| MaterialContainer::ProfileSet(set).materials(resolver))
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_usd_model::EntityId;
    use ifc_usd_parser::ResolverImpl;

    const MATERIALS: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCMATERIAL('Plaster',$,$);
#2=IFCMATERIAL('Brick',$,$);
#3=IFCMATERIAL('Insulation',$,$);
#10=IFCMATERIALLAYER(#1,0.015,$,$,$,$,$);
#11=IFCMATERIALLAYER(#2,0.24,$,$,$,$,$);
#12=IFCMATERIALLAYERSET((#10,#11),'Exterior Wall',$);
#13=IFCMATERIALLAYERSETUSAGE(#12,.AXIS2.,.POSITIVE.,0.,$);
#20=IFCMATERIALLIST((#3,#1));
#30=IFCMATERIALCONSTITUENT('Frame',$,#2,$,$);
#31=IFCMATERIALCONSTITUENT('Glazing',$,#3,$,$);
#32=IFCMATERIALCONSTITUENTSET('Window',$,(#30,#31));
#40=IFCMATERIALPROFILE('Steel',$,#2,$,$,$);
#41=IFCMATERIALPROFILESET('Beam',$,(#40),$);
#42=IFCMATERIALPROFILESETUSAGE(#41,$,$);
#50=IFCWALL('0aaaaaaaaaaaaaaaaaaaaa',$,'Typed wall',$,$,$,$,$,$);
#51=IFCWALLTYPE('0bbbbbbbbbbbbbbbbbbbbb',$,'Type',$,$,$,$,$,$,.STANDARD.);
#52=IFCRELDEFINESBYTYPE('0ccccccccccccccccccccc',$,$,$,(#50),#51);
#53=IFCRELASSOCIATESMATERIAL('0ddddddddddddddddddddd',$,$,$,(#51),#13);
#54=IFCWALL('0eeeeeeeeeeeeeeeeeeeee',$,'Own material',$,$,$,$,$,$);
#55=IFCRELDEFINESBYTYPE('0fffffffffffffffffffff',$,$,$,(#54),#51);
#56=IFCRELASSOCIATESMATERIAL('0ggggggggggggggggggggg',$,$,$,(#54),#20);
#57=IFCWALL('0hhhhhhhhhhhhhhhhhhhhh',$,'Bare',$,$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    fn names(container: &MaterialContainer, resolver: &ResolverImpl) -> Vec<String> {
        container
            .materials(resolver)
            .iter()
            .filter_map(|m| m.name().map(str::to_string))
            .collect()
    }

    fn container(resolver: &ResolverImpl, id: u32) -> MaterialContainer {
        MaterialContainer::from_entity(resolver.get(EntityId(id)).unwrap(), resolver).unwrap()
    }

    #[test]
    fn test_every_variant_resolves_in_source_order() {
        let resolver = ResolverImpl::new(MATERIALS.to_string());
        assert_eq!(names(&container(&resolver, 2), &resolver), ["Brick"]);
        assert_eq!(names(&container(&resolver, 20), &resolver), ["Insulation", "Plaster"]);
        assert_eq!(names(&container(&resolver, 12), &resolver), ["Plaster", "Brick"]);
        assert_eq!(names(&container(&resolver, 13), &resolver), ["Plaster", "Brick"]);
        assert_eq!(names(&container(&resolver, 32), &resolver), ["Brick", "Insulation"]);
        assert_eq!(names(&container(&resolver, 41), &resolver), ["Brick"]);
        assert_eq!(names(&container(&resolver, 42), &resolver), ["Brick"]);
        assert!(matches!(container(&resolver, 13), MaterialContainer::LayerSetUsage(_)));
    }

    #[test]
    fn test_single_layer_stands_for_its_material() {
        let resolver = ResolverImpl::new(MATERIALS.to_string());
        let layer = container(&resolver, 11);
        assert!(matches!(layer, MaterialContainer::Material(_)));
        assert_eq!(layer.entity().id, EntityId(2));
    }

    #[test]
    fn test_element_association_beats_type_association() {
        let resolver = ResolverImpl::new(MATERIALS.to_string());

        let typed = resolver.get(EntityId(50)).unwrap();
        let from_type = MaterialContainer::for_element(&typed, &resolver).unwrap();
        assert_eq!(from_type.entity().id, EntityId(13));

        let own = resolver.get(EntityId(54)).unwrap();
        let from_element = MaterialContainer::for_element(&own, &resolver).unwrap();
        assert_eq!(from_element.entity().id, EntityId(20));

        let bare = resolver.get(EntityId(57)).unwrap();
        assert!(MaterialContainer::for_element(&bare, &resolver).is_none());
    }
}
