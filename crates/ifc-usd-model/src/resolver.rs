// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity resolution trait for looking up and navigating IFC entities

use crate::{AttributeValue, DecodedEntity, EntityId, IfcType};
use std::sync::Arc;

/// Entity lookup, reference resolution and inverse attribute access
///
/// Implementations should provide O(1) lookup by entity ID and answer inverse
/// queries from an index built once at load time.
///
/// # Example
///
/// ```ignore
/// use ifc_usd_model::{EntityResolver, EntityResolverExt, EntityId};
///
/// fn print_openings(resolver: &dyn EntityResolver, wall_id: EntityId) {
///     if let Some(wall) = resolver.get(wall_id) {
///         for rel in resolver.inverse_of(&wall, "HasOpenings") {
///             for opening in resolver.attr_entities(&rel, "RelatedOpeningElement") {
///                 println!("{} voids {}", opening.id, wall.id);
///             }
///         }
///     }
/// }
/// ```
pub trait EntityResolver: Send + Sync {
    /// Get entity by ID
    ///
    /// Returns the decoded entity if it exists, wrapped in an Arc for
    /// efficient sharing.
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>>;

    /// Resolve an entity reference from an attribute value
    fn resolve_ref(&self, attr: &AttributeValue) -> Option<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::EntityRef(id) => self.get(*id),
            _ => None,
        }
    }

    /// Resolve a list of entity references
    ///
    /// Returns an empty vector if the attribute is not a list or contains no refs.
    fn resolve_ref_list(&self, attr: &AttributeValue) -> Vec<Arc<DecodedEntity>> {
        match attr {
            AttributeValue::List(items) => items
                .iter()
                .filter_map(|item| self.resolve_ref(item))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Get all entities of exactly this type, in file order
    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>>;

    /// Get all entities of this type or any subtype, in file order
    fn instances_of(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>>;

    /// Find instances by type name string (case-insensitive, subtypes included)
    fn find_by_type_name(&self, type_name: &str) -> Vec<Arc<DecodedEntity>> {
        self.instances_of(&IfcType::parse(type_name))
    }

    /// Count entities of exactly this type
    fn count_by_type(&self, ifc_type: &IfcType) -> usize;

    /// Entities holding a back-reference to `id` under the inverse attribute `name`
    ///
    /// Order follows the referencing entities' position in the file.
    fn inverse(&self, id: EntityId, name: &str) -> Vec<Arc<DecodedEntity>>;

    /// Get all entity IDs in the model, in file order
    fn all_ids(&self) -> Vec<EntityId>;

    /// Get total entity count
    fn entity_count(&self) -> usize {
        self.all_ids().len()
    }
}

/// Extension methods for EntityResolver
pub trait EntityResolverExt: EntityResolver {
    /// Get entity or return error
    fn get_or_err(&self, id: EntityId) -> crate::Result<Arc<DecodedEntity>> {
        self.get(id).ok_or(crate::ParseError::EntityNotFound(id))
    }

    /// Follow a named single-reference attribute
    fn attr_entity(&self, entity: &DecodedEntity, name: &str) -> Option<Arc<DecodedEntity>> {
        entity.attr_ref(name).and_then(|id| self.get(id))
    }

    /// Follow a named attribute holding one reference or a list of them
    fn attr_entities(&self, entity: &DecodedEntity, name: &str) -> Vec<Arc<DecodedEntity>> {
        entity
            .attr_refs(name)
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Inverse attribute of a decoded entity
    fn inverse_of(&self, entity: &DecodedEntity, name: &str) -> Vec<Arc<DecodedEntity>> {
        self.inverse(entity.id, name)
    }
}

// Blanket implementation for all EntityResolver types
impl<T: EntityResolver + ?Sized> EntityResolverExt for T {}
