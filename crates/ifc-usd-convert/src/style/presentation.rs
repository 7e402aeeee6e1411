// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Navigation from geometry and styled items to surface styles and renderings

use ifc_usd_model::{DecodedEntity, EntityResolver, EntityResolverExt, IfcType};
use std::sync::Arc;

/// Mapped representations nested deeper than this are not searched
const MAX_MAPPING_DEPTH: usize = 8;

/// Surface styles held by a presentation style select
///
/// Accepts an `IfcSurfaceStyle` directly or the IFC2X3
/// `IfcPresentationStyleAssignment` wrapper.
pub fn surface_styles(
    style: &Arc<DecodedEntity>,
    resolver: &dyn EntityResolver,
) -> Vec<Arc<DecodedEntity>> {
    match style.ifc_type {
        IfcType::IfcSurfaceStyle => vec![Arc::clone(style)],
        IfcType::IfcPresentationStyleAssignment => resolver
            .attr_entities(style, "Styles")
            .into_iter()
            .filter(|s| s.ifc_type == IfcType::IfcSurfaceStyle)
            .collect(),
        _ => Vec::new(),
    }
}

/// Surface styles of an `IfcStyledItem`
pub fn styled_item_styles(
    styled_item: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Vec<Arc<DecodedEntity>> {
    resolver
        .attr_entities(styled_item, "Styles")
        .iter()
        .flat_map(|style| surface_styles(style, resolver))
        .collect()
}

/// First rendering sub-style of a style
///
/// A rendering (or plain shading) passed in is returned as is.
pub fn rendering_of(
    style: &Arc<DecodedEntity>,
    resolver: &dyn EntityResolver,
) -> Option<Arc<DecodedEntity>> {
    if style.ifc_type.is_a(&IfcType::IfcSurfaceStyleShading) {
        return Some(Arc::clone(style));
    }
    surface_styles(style, resolver).iter().find_map(|surface| {
        resolver
            .attr_entities(surface, "Styles")
            .into_iter()
            .find(|s| s.ifc_type.is_a(&IfcType::IfcSurfaceStyleShading))
    })
}

/// Surface styles embedded in an element's own shape representations
///
/// Covers styled items listed among representation items, styled items
/// pointing at geometry items, and items reached through `IfcMappedItem`.
pub fn geometry_styles(
    element: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Vec<Arc<DecodedEntity>> {
    let mut styles = Vec::new();
    if let Some(shape) = resolver.attr_entity(element, "Representation") {
        for representation in resolver.attr_entities(&shape, "Representations") {
            collect_representation_styles(&representation, resolver, 0, &mut styles);
        }
    }
    styles
}

fn collect_representation_styles(
    representation: &DecodedEntity,
    resolver: &dyn EntityResolver,
    depth: usize,
    styles: &mut Vec<Arc<DecodedEntity>>,
) {
    for item in resolver.attr_entities(representation, "Items") {
        collect_item_styles(&item, resolver, depth, styles);
    }
}

fn collect_item_styles(
    item: &DecodedEntity,
    resolver: &dyn EntityResolver,
    depth: usize,
    styles: &mut Vec<Arc<DecodedEntity>>,
) {
    if item.ifc_type == IfcType::IfcStyledItem {
        styles.extend(styled_item_styles(item, resolver));
        return;
    }

    for styled_item in resolver.inverse_of(item, "StyledByItem") {
        styles.extend(styled_item_styles(&styled_item, resolver));
    }

    if item.ifc_type == IfcType::IfcMappedItem && depth < MAX_MAPPING_DEPTH {
        let mapped = resolver
            .attr_entity(item, "MappingSource")
            .and_then(|source| resolver.attr_entity(&source, "MappedRepresentation"));
        if let Some(representation) = mapped {
            collect_representation_styles(&representation, resolver, depth + 1, styles);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_usd_model::EntityId;
    use ifc_usd_parser::ResolverImpl;

    const STYLED: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCCOLOURRGB($,0.1,0.2,0.3);
#2=IFCSURFACESTYLERENDERING(#1,0.,$,$,$,$,$,$,.FLAT.);
#3=IFCSURFACESTYLE('Mapped',.BOTH.,(#2));
#4=IFCPRESENTATIONSTYLEASSIGNMENT((#3));
#5=IFCTRIANGULATEDFACESET(#99,$,$,((1,2,3)),$);
#6=IFCSTYLEDITEM(#5,(#4),$);
#7=IFCSHAPEREPRESENTATION(#98,'Body','Tessellation',(#5));
#8=IFCREPRESENTATIONMAP(#97,#7);
#9=IFCMAPPEDITEM(#8,#96);
#10=IFCSHAPEREPRESENTATION(#98,'Body','MappedRepresentation',(#9));
#11=IFCPRODUCTDEFINITIONSHAPE($,$,(#10));
#12=IFCBUILDINGELEMENTPROXY('0aaaaaaaaaaaaaaaaaaaaa',$,'Proxy',$,$,$,#11,$,$);
#20=IFCSURFACESTYLESHADING(#1,$);
#21=IFCSURFACESTYLE('Listed',.BOTH.,(#20));
#22=IFCSTYLEDITEM($,(#21),$);
#23=IFCSHAPEREPRESENTATION(#98,'Body','Brep',(#22));
#24=IFCPRODUCTDEFINITIONSHAPE($,$,(#23));
#25=IFCBUILDINGELEMENTPROXY('0bbbbbbbbbbbbbbbbbbbbb',$,'Listed',$,$,$,#24,$,$);
#26=IFCBUILDINGELEMENTPROXY('0ccccccccccccccccccccc',$,'Bare',$,$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_styles_through_mapped_items() {
        let resolver = ResolverImpl::new(STYLED.to_string());
        let proxy = resolver.get(EntityId(12)).unwrap();

        let styles = geometry_styles(&proxy, &resolver);
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].id, EntityId(3));

        let rendering = rendering_of(&styles[0], &resolver).unwrap();
        assert_eq!(rendering.id, EntityId(2));
    }

    #[test]
    fn test_styled_item_listed_as_representation_item() {
        let resolver = ResolverImpl::new(STYLED.to_string());
        let proxy = resolver.get(EntityId(25)).unwrap();

        let styles = geometry_styles(&proxy, &resolver);
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].name(), Some("Listed"));
        // Plain shading counts as a rendering
        assert_eq!(rendering_of(&styles[0], &resolver).unwrap().id, EntityId(20));
    }

    #[test]
    fn test_rendering_of_assignment_and_rendering() {
        let resolver = ResolverImpl::new(STYLED.to_string());
        let assignment = resolver.get(EntityId(4)).unwrap();
        assert_eq!(rendering_of(&assignment, &resolver).unwrap().id, EntityId(2));

        let rendering = resolver.get(EntityId(2)).unwrap();
        assert_eq!(rendering_of(&rendering, &resolver).unwrap().id, EntityId(2));

        let bare = resolver.get(EntityId(26)).unwrap();
        assert!(geometry_styles(&bare, &resolver).is_empty());
    }
}
