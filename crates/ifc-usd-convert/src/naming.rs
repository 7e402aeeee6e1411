// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prim and material naming

use ifc_usd_model::DecodedEntity;

/// Replace every character outside `[A-Za-z0-9_]` with `_`
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Deduplication identity of an entity's node: `{Type}_{GlobalId}_{id}`
pub fn node_name(entity: &DecodedEntity) -> String {
    sanitize(&format!(
        "{}_{}_{}",
        entity.ifc_type.name(),
        entity.global_id().unwrap_or_default(),
        entity.id.0
    ))
}

/// Cache key and prim name of a material
///
/// Already a valid prim identifier, so the key is the prim name unchanged.
pub fn material_key(name: &str) -> String {
    let key = sanitize(name.trim());
    match key.chars().next() {
        None => "Material".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{}", key),
        Some(_) => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_usd_model::{AttributeValue, EntityId, IfcType};

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Concrete - C30/37"), "Concrete___C30_37");
        assert_eq!(sanitize("Glas\u{e4}ser"), "Glas_ser");
        assert_eq!(sanitize("already_ok_1"), "already_ok_1");
    }

    #[test]
    fn test_node_name() {
        let wall = DecodedEntity {
            id: EntityId(42),
            ifc_type: IfcType::IfcWall,
            attributes: vec![AttributeValue::String("2O2Fr$t4X7Zf8NOew3FL$O".into())],
        };
        assert_eq!(node_name(&wall), "IfcWall_2O2Fr_t4X7Zf8NOew3FL_O_42");
    }

    #[test]
    fn test_material_key() {
        assert_eq!(material_key("Red Brick"), "Red_Brick");
        assert_eq!(material_key("  "), "Material");
    }

    #[test]
    fn test_material_key_leading_digit() {
        assert_eq!(material_key("2x4"), "_2x4");
        assert_eq!(material_key("2x4"), material_key("_2x4"));
    }
}
