// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! EntityResolver trait implementation

use crate::scanner::{EntityIndex, EntityScanner};
use crate::tokenizer::parse_entity_at;
use ifc_usd_model::schema::{canonical_inverse, InverseLink, INVERSE_LINKS};
use ifc_usd_model::{DecodedEntity, EntityId, EntityResolver, IfcType};
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// (target entity, inverse attribute name) -> referencing entities in file order
type InverseIndex = FxHashMap<(u32, &'static str), Vec<EntityId>>;

/// Thread-safe entity resolver implementation
///
/// Entities are decoded lazily and cached. Type and inverse indexes are built
/// once when the resolver is created.
pub struct ResolverImpl {
    /// Raw IFC content (owned for thread safety)
    content: String,
    /// Entity ID -> (start, end) byte offsets
    index: EntityIndex,
    /// Entity IDs in file order
    order: Vec<EntityId>,
    /// Decoded entity cache (thread-safe)
    cache: RwLock<FxHashMap<u32, Arc<DecodedEntity>>>,
    /// Type -> entity IDs index
    type_index: FxHashMap<IfcType, Vec<EntityId>>,
    /// Inverse attribute index
    inverse_index: InverseIndex,
}

impl ResolverImpl {
    /// Scan content and build every index
    pub fn new(content: String) -> Self {
        let mut index = EntityIndex::default();
        let mut order = Vec::new();
        let mut type_index: FxHashMap<IfcType, Vec<EntityId>> = FxHashMap::default();

        let mut scanner = EntityScanner::new(&content);
        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            index.insert(id, (start, end));
            order.push(EntityId(id));
            type_index
                .entry(IfcType::parse(type_name))
                .or_default()
                .push(EntityId(id));
        }

        let mut resolver = Self {
            content,
            index,
            order,
            cache: RwLock::new(FxHashMap::default()),
            type_index,
            inverse_index: InverseIndex::default(),
        };
        resolver.inverse_index = resolver.build_inverse_index();
        resolver
    }

    /// Get raw content
    pub fn content(&self) -> &str {
        &self.content
    }

    fn build_inverse_index(&self) -> InverseIndex {
        let links: Vec<(IfcType, &InverseLink)> = INVERSE_LINKS
            .iter()
            .map(|link| (IfcType::parse(link.relation), link))
            .collect();

        // Which links apply to each concrete type present in the file
        let mut applicable: FxHashMap<&IfcType, Vec<&InverseLink>> = FxHashMap::default();
        for ifc_type in self.type_index.keys() {
            let matching: Vec<&InverseLink> = links
                .iter()
                .filter(|(relation, _)| ifc_type.is_a(relation))
                .map(|(_, link)| *link)
                .collect();
            if !matching.is_empty() {
                applicable.insert(ifc_type, matching);
            }
        }

        let mut relation_ids: Vec<(EntityId, &Vec<&InverseLink>)> = applicable
            .iter()
            .flat_map(|(ifc_type, links)| {
                self.type_index[*ifc_type].iter().map(move |id| (*id, links))
            })
            .collect();
        relation_ids.sort_by_key(|(id, _)| self.position(*id));

        let mut inverse = InverseIndex::default();
        for (id, links) in relation_ids {
            let Some(relation) = self.get(id) else {
                continue;
            };
            for link in links {
                for target in relation.attr_refs(link.forward) {
                    inverse.entry((target.0, link.name)).or_default().push(id);
                }
            }
        }
        inverse
    }

    fn position(&self, id: EntityId) -> usize {
        self.index.get(&id.0).map(|(start, _)| *start).unwrap_or(usize::MAX)
    }

    /// Decode and cache an entity
    fn decode_and_cache(&self, id: u32) -> Option<Arc<DecodedEntity>> {
        {
            let cache = self.cache.read().ok()?;
            if let Some(cached) = cache.get(&id) {
                return Some(Arc::clone(cached));
            }
        }

        let (start, end) = self.index.get(&id)?;

        let entity = match parse_entity_at(&self.content, *start, *end) {
            Ok(entity) => entity,
            Err(message) => {
                log::debug!("Skipping undecodable entity #{}: {}", id, message);
                return None;
            }
        };
        let arc = Arc::new(entity);

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id, Arc::clone(&arc));
        }

        Some(arc)
    }
}

impl EntityResolver for ResolverImpl {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.decode_and_cache(id.0)
    }

    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.type_index
            .get(ifc_type)
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    fn instances_of(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        let mut ids: Vec<EntityId> = self
            .type_index
            .iter()
            .filter(|(ty, _)| ty.is_a(ifc_type))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        ids.sort_by_key(|id| self.position(*id));
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    fn count_by_type(&self, ifc_type: &IfcType) -> usize {
        self.type_index.get(ifc_type).map(|v| v.len()).unwrap_or(0)
    }

    fn inverse(&self, id: EntityId, name: &str) -> Vec<Arc<DecodedEntity>> {
        let name = canonical_inverse(name);
        let Some(link) = INVERSE_LINKS.iter().find(|link| link.name == name) else {
            return Vec::new();
        };
        self.inverse_index
            .get(&(id.0, link.name))
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    fn all_ids(&self) -> Vec<EntityId> {
        self.order.clone()
    }

    fn entity_count(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_usd_model::EntityResolverExt;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Wall 1',$,$,$,$,$,$);
#5=IFCWALLSTANDARDCASE('3vB2YO$MX4xv5uCqZZG05x',$,'Wall 2',$,$,$,$,$,$);
#6=IFCBUILDINGSTOREY('1xS3BCk291UvhgP2dvNsgp',$,'Level 1',$,$,$,$,$,.ELEMENT.,0.);
#7=IFCRELCONTAINEDINSPATIALSTRUCTURE('2eyxpyOx95m90jmsXLOuR0',$,$,$,(#5,#4),#6);
#8=IFCMATERIAL('Concrete',$,$);
#9=IFCRELASSOCIATESMATERIAL('0Q5nTKKXz3Bw8fPX5zGWmX',$,$,$,(#4),#8);
#10=IFCRELASSOCIATESMATERIAL('1Q5nTKKXz3Bw8fPX5zGWmX',$,$,$,(#4,#5),#8);
ENDSEC;
END-ISO-10303-21;
"#;

    fn resolver() -> ResolverImpl {
        ResolverImpl::new(TEST_IFC.to_string())
    }

    #[test]
    fn test_resolver_get() {
        let entity = resolver().get(EntityId(1)).unwrap();
        assert_eq!(entity.id, EntityId(1));
        assert_eq!(entity.ifc_type, IfcType::IfcProject);
    }

    #[test]
    fn test_entities_by_type_is_exact() {
        let walls = resolver().entities_by_type(&IfcType::IfcWall);
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].id, EntityId(4));
    }

    #[test]
    fn test_instances_of_includes_subtypes_in_file_order() {
        let ids: Vec<_> = resolver()
            .instances_of(&IfcType::IfcWall)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![EntityId(4), EntityId(5)]);

        let products = resolver().find_by_type_name("IfcProduct");
        assert_eq!(products.len(), 3);
    }

    #[test]
    fn test_inverse_attributes() {
        let resolver = resolver();
        let storey = resolver.get(EntityId(6)).unwrap();
        let contains = resolver.inverse_of(&storey, "ContainsElements");
        assert_eq!(contains.len(), 1);
        assert_eq!(contains[0].id, EntityId(7));

        let wall = resolver.get(EntityId(4)).unwrap();
        let associations: Vec<_> = resolver
            .inverse_of(&wall, "HasAssociations")
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(associations, vec![EntityId(9), EntityId(10)]);
        assert_eq!(resolver.inverse_of(&wall, "ContainedInStructure").len(), 1);

        let material = resolver.get(EntityId(8)).unwrap();
        assert_eq!(resolver.inverse_of(&material, "AssociatedTo").len(), 2);
    }

    #[test]
    fn test_unknown_inverse_is_empty() {
        assert!(resolver().inverse(EntityId(4), "NoSuchInverse").is_empty());
    }

    #[test]
    fn test_all_ids_in_file_order() {
        let ids = resolver().all_ids();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids.first(), Some(&EntityId(1)));
        assert_eq!(ids.last(), Some(&EntityId(10)));
    }

    #[test]
    fn test_resolver_thread_safe() {
        use std::thread;

        let resolver = Arc::new(resolver());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                thread::spawn(move || {
                    for id in 1..=10 {
                        assert!(resolver.get(EntityId(id)).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
