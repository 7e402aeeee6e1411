// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reduce attribute values to the scalars a metadata dictionary can hold
//!
//! Plain scalars pass through. Typed measures such as `IFCLENGTHMEASURE(2.5)`
//! are unwrapped. Sequences become comma-joined strings. Anything else uses
//! its string form.

use ifc_usd_model::{AttributeValue, MetadataValue};

/// Scalar form of a value, `None` when the value is unset
pub fn scalarize(value: &AttributeValue) -> Option<MetadataValue> {
    match value {
        AttributeValue::Null | AttributeValue::Derived => None,
        AttributeValue::String(s) => Some(MetadataValue::String(s.clone())),
        AttributeValue::Integer(i) => Some(MetadataValue::Int(*i)),
        AttributeValue::Float(f) => Some(MetadataValue::Float(*f)),
        AttributeValue::Bool(b) => Some(MetadataValue::Bool(*b)),
        AttributeValue::Enum(e) => match e.as_str() {
            "T" => Some(MetadataValue::Bool(true)),
            "F" => Some(MetadataValue::Bool(false)),
            _ => Some(MetadataValue::String(e.clone())),
        },
        AttributeValue::TypedValue(_, args) => args.first().and_then(scalarize),
        AttributeValue::List(items) => {
            let joined: Vec<String> = items
                .iter()
                .filter_map(scalarize)
                .map(|v| v.to_string())
                .collect();
            Some(MetadataValue::String(joined.join(", ")))
        }
        AttributeValue::EntityRef(id) => Some(MetadataValue::String(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_usd_model::EntityId;

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(
            scalarize(&AttributeValue::String("Wall".into())),
            Some(MetadataValue::String("Wall".into()))
        );
        assert_eq!(scalarize(&AttributeValue::Integer(3)), Some(MetadataValue::Int(3)));
        assert_eq!(scalarize(&AttributeValue::Float(2.5)), Some(MetadataValue::Float(2.5)));
        assert_eq!(scalarize(&AttributeValue::Null), None);
    }

    #[test]
    fn test_step_booleans_and_enums() {
        assert_eq!(
            scalarize(&AttributeValue::Enum("T".into())),
            Some(MetadataValue::Bool(true))
        );
        assert_eq!(
            scalarize(&AttributeValue::Enum("SOLIDWALL".into())),
            Some(MetadataValue::String("SOLIDWALL".into()))
        );
    }

    #[test]
    fn test_typed_measures_are_unwrapped() {
        let nested = AttributeValue::TypedValue(
            "IFCPOSITIVELENGTHMEASURE".into(),
            vec![AttributeValue::TypedValue(
                "IFCLENGTHMEASURE".into(),
                vec![AttributeValue::Float(0.2)],
            )],
        );
        assert_eq!(scalarize(&nested), Some(MetadataValue::Float(0.2)));
        assert_eq!(
            scalarize(&AttributeValue::TypedValue("IFCLABEL".into(), vec![])),
            None
        );
    }

    #[test]
    fn test_sequences_are_joined() {
        let list = AttributeValue::List(vec![
            AttributeValue::String("A".into()),
            AttributeValue::Null,
            AttributeValue::Integer(2),
            AttributeValue::EntityRef(EntityId(7)),
        ]);
        assert_eq!(scalarize(&list), Some(MetadataValue::String("A, 2, #7".into())));
    }
}
