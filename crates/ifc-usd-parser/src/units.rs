// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit scale extraction from IFC files

use ifc_usd_model::{AttributeValue, DecodedEntity, EntityResolver, EntityResolverExt, IfcType};

/// Extract the length unit scale (file units to meters)
///
/// Reads the first IFCPROJECT's UnitsInContext. Returns 1.0 if no length unit
/// is declared.
pub fn extract_unit_scale(resolver: &dyn EntityResolver) -> f64 {
    let Some(project) = resolver.entities_by_type(&IfcType::IfcProject).into_iter().next() else {
        return 1.0;
    };

    let Some(assignment) = resolver.attr_entity(&project, "UnitsInContext") else {
        return 1.0;
    };

    resolver
        .attr_entities(&assignment, "Units")
        .iter()
        .find_map(|unit| length_unit_scale(unit, resolver))
        .unwrap_or(1.0)
}

/// Scale of an IFCSIUNIT or IFCCONVERSIONBASEDUNIT when it measures length
fn length_unit_scale(unit: &DecodedEntity, resolver: &dyn EntityResolver) -> Option<f64> {
    if unit.attr_enum("UnitType")? != "LENGTHUNIT" {
        return None;
    }
    match unit.ifc_type {
        IfcType::IfcSIUnit => si_unit_scale(unit),
        IfcType::IfcConversionBasedUnit => conversion_unit_scale(unit, resolver),
        _ => None,
    }
}

/// IFCSIUNIT(*, UnitType, Prefix, Name)
fn si_unit_scale(unit: &DecodedEntity) -> Option<f64> {
    if unit.attr_enum("Name")? != "METRE" {
        return None;
    }
    let prefix = unit.attr_enum("Prefix").map(prefix_scale).unwrap_or(1.0);
    Some(prefix)
}

fn prefix_scale(prefix: &str) -> f64 {
    match prefix {
        "EXA" => 1e18,
        "PETA" => 1e15,
        "TERA" => 1e12,
        "GIGA" => 1e9,
        "MEGA" => 1e6,
        "KILO" => 1e3,
        "HECTO" => 1e2,
        "DECA" => 1e1,
        "DECI" => 1e-1,
        "CENTI" => 1e-2,
        "MILLI" => 1e-3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        "PICO" => 1e-12,
        "FEMTO" => 1e-15,
        "ATTO" => 1e-18,
        _ => 1.0,
    }
}

/// IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
fn conversion_unit_scale(unit: &DecodedEntity, resolver: &dyn EntityResolver) -> Option<f64> {
    let factor = resolver.attr_entity(unit, "ConversionFactor")?;
    if factor.ifc_type != IfcType::IfcMeasureWithUnit {
        return None;
    }

    let value = measure_value(factor.attr("ValueComponent")?)?;
    let base_scale = resolver
        .attr_entity(&factor, "UnitComponent")
        .and_then(|base| length_unit_scale(&base, resolver))
        .unwrap_or(1.0);

    Some(value * base_scale)
}

fn measure_value(attr: &AttributeValue) -> Option<f64> {
    match attr {
        AttributeValue::Float(f) => Some(*f),
        AttributeValue::Integer(i) => Some(*i as f64),
        AttributeValue::TypedValue(_, args) => args.first().and_then(measure_value),
        _ => None,
    }
}
