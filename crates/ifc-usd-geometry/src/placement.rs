// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement resolution
//!
//! Turns IFC placement entities into homogeneous matrices. Missing optional
//! axes fall back to the schema defaults (Z up, X along the reference).

use ifc_usd_model::{AttributeValue, DecodedEntity, EntityResolver, EntityResolverExt, IfcType};
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};

/// Placement chains deeper than this are treated as cyclic
const MAX_PLACEMENT_DEPTH: usize = 64;

/// Read coordinates from a list of numbers, padding missing axes with zero
pub fn coordinates(values: &[AttributeValue]) -> Point3<f64> {
    let axis = |i: usize| values.get(i).and_then(|v| v.as_float()).unwrap_or(0.0);
    Point3::new(axis(0), axis(1), axis(2))
}

/// IfcCartesianPoint as a 3D point (2D points get z = 0)
pub fn cartesian_point(point: &DecodedEntity) -> Option<Point3<f64>> {
    if point.ifc_type != IfcType::IfcCartesianPoint {
        return None;
    }
    point.get_list(0).map(coordinates)
}

/// IfcDirection as a vector
pub fn direction(direction: &DecodedEntity) -> Option<Vector3<f64>> {
    if direction.ifc_type != IfcType::IfcDirection {
        return None;
    }
    let ratios = direction.get_list(0)?;
    let axis = |i: usize, default: f64| ratios.get(i).and_then(|v| v.as_float()).unwrap_or(default);
    // 2D directions have no Z component
    let z = if ratios.len() < 3 { 0.0 } else { axis(2, 0.0) };
    Some(Vector3::new(axis(0, 0.0), axis(1, 0.0), z))
}

fn attr_direction(
    entity: &DecodedEntity,
    name: &str,
    resolver: &dyn EntityResolver,
) -> Option<Vector3<f64>> {
    resolver
        .attr_entity(entity, name)
        .and_then(|d| direction(&d))
        .and_then(|v| v.try_normalize(1e-12))
}

fn attr_point(entity: &DecodedEntity, name: &str, resolver: &dyn EntityResolver) -> Point3<f64> {
    resolver
        .attr_entity(entity, name)
        .and_then(|p| cartesian_point(&p))
        .unwrap_or_else(Point3::origin)
}

/// Orthonormal frame matrix from location, Z axis and X reference
fn frame(location: Point3<f64>, axis: Vector3<f64>, ref_dir: Vector3<f64>) -> Matrix4<f64> {
    let z = axis;
    // Gram-Schmidt: project the reference onto the plane normal to Z
    let x = (ref_dir - z * ref_dir.dot(&z))
        .try_normalize(1e-12)
        .unwrap_or_else(|| any_perpendicular(&z));
    let y = z.cross(&x);

    Matrix4::new(
        x.x, y.x, z.x, location.x, //
        x.y, y.y, z.y, location.y, //
        x.z, y.z, z.z, location.z, //
        0.0, 0.0, 0.0, 1.0,
    )
}

fn any_perpendicular(z: &Vector3<f64>) -> Vector3<f64> {
    let reference = if z.x.abs() < 0.9 {
        Vector3::new(1.0, 0.0, 0.0)
    } else {
        Vector3::new(0.0, 1.0, 0.0)
    };
    (reference - z * reference.dot(z)).normalize()
}

/// IfcAxis2Placement3D
pub fn axis2_placement_3d(placement: &DecodedEntity, resolver: &dyn EntityResolver) -> Matrix4<f64> {
    let location = attr_point(placement, "Location", resolver);
    let axis = attr_direction(placement, "Axis", resolver).unwrap_or_else(Vector3::z);
    let ref_dir = attr_direction(placement, "RefDirection", resolver).unwrap_or_else(Vector3::x);
    frame(location, axis, ref_dir)
}

/// IfcAxis2Placement2D as a homogeneous 2D matrix (profile positions)
pub fn axis2_placement_2d(placement: &DecodedEntity, resolver: &dyn EntityResolver) -> Matrix3<f64> {
    let location = attr_point(placement, "Location", resolver);
    let x = attr_direction(placement, "RefDirection", resolver)
        .and_then(|v| Vector3::new(v.x, v.y, 0.0).try_normalize(1e-12))
        .unwrap_or_else(Vector3::x);

    Matrix3::new(
        x.x, -x.y, location.x, //
        x.y, x.x, location.y, //
        0.0, 0.0, 1.0,
    )
}

/// IfcCartesianTransformationOperator3D (and the non-uniform subtype)
pub fn transformation_operator(
    operator: &DecodedEntity,
    resolver: &dyn EntityResolver,
) -> Matrix4<f64> {
    let origin = attr_point(operator, "LocalOrigin", resolver);
    let axis1 = attr_direction(operator, "Axis1", resolver);
    let axis2 = attr_direction(operator, "Axis2", resolver);
    let axis3 = attr_direction(operator, "Axis3", resolver);

    let scale = operator.attr_float("Scale").unwrap_or(1.0);
    let (scale2, scale3) = if operator.ifc_type == IfcType::IfcCartesianTransformationOperator3DnonUniform
    {
        (
            operator.attr_float("Scale2").unwrap_or(scale),
            operator.attr_float("Scale3").unwrap_or(scale),
        )
    } else {
        (scale, scale)
    };

    let z = axis3.unwrap_or_else(Vector3::z);
    let x_ref = axis1.unwrap_or_else(Vector3::x);
    let mut rotation = frame(origin, z, x_ref);
    if let Some(y_ref) = axis2 {
        // Respect a left-handed operator
        let y = Vector3::new(rotation[(0, 1)], rotation[(1, 1)], rotation[(2, 1)]);
        if y.dot(&y_ref) < 0.0 {
            for row in 0..3 {
                rotation[(row, 1)] = -rotation[(row, 1)];
            }
        }
    }

    rotation * Matrix4::new_nonuniform_scaling(&Vector3::new(scale, scale2, scale3))
}

/// IfcLocalPlacement, composed with every `PlacementRelTo` ancestor
pub fn local_placement(placement: &DecodedEntity, resolver: &dyn EntityResolver) -> Matrix4<f64> {
    let mut result = Matrix4::identity();
    let mut current = Some(placement.id);
    let mut depth = 0;

    while let Some(id) = current.take() {
        if depth == MAX_PLACEMENT_DEPTH {
            log::warn!("Placement chain from #{} is too deep; truncated", placement.id.0);
            break;
        }
        depth += 1;

        let Some(entity) = resolver.get(id) else {
            break;
        };
        if entity.ifc_type != IfcType::IfcLocalPlacement {
            break;
        }

        if let Some(relative) = resolver.attr_entity(&entity, "RelativePlacement") {
            result = placement_matrix(&relative, resolver) * result;
        }
        current = entity.attr_ref("PlacementRelTo");
    }

    result
}

/// Any supported placement entity as a 3D matrix
pub fn placement_matrix(placement: &DecodedEntity, resolver: &dyn EntityResolver) -> Matrix4<f64> {
    match placement.ifc_type {
        IfcType::IfcLocalPlacement => local_placement(placement, resolver),
        IfcType::IfcAxis2Placement3D => axis2_placement_3d(placement, resolver),
        IfcType::IfcAxis2Placement2D => {
            let m = axis2_placement_2d(placement, resolver);
            Matrix4::new(
                m[(0, 0)], m[(0, 1)], 0.0, m[(0, 2)], //
                m[(1, 0)], m[(1, 1)], 0.0, m[(1, 2)], //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            )
        }
        ref ty if ty.is_a(&IfcType::IfcCartesianTransformationOperator) => {
            transformation_operator(placement, resolver)
        }
        _ => Matrix4::identity(),
    }
}

/// Drop a 3D point onto the profile plane
pub fn to_2d(point: &Point3<f64>) -> Point2<f64> {
    Point2::new(point.x, point.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_usd_model::EntityId;
    use ifc_usd_parser::ResolverImpl;

    const PLACEMENTS: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCCARTESIANPOINT((10.,0.,0.));
#2=IFCAXIS2PLACEMENT3D(#1,$,$);
#3=IFCLOCALPLACEMENT($,#2);
#4=IFCCARTESIANPOINT((0.,5.,1.));
#5=IFCDIRECTION((0.,1.,0.));
#6=IFCDIRECTION((0.,0.,1.));
#7=IFCAXIS2PLACEMENT3D(#4,#6,#5);
#8=IFCLOCALPLACEMENT(#3,#7);
#9=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#1,2.,$);
#10=IFCCARTESIANPOINT((1.,2.));
#11=IFCAXIS2PLACEMENT2D(#10,$);
ENDSEC;
END-ISO-10303-21;
"#;

    fn resolver() -> ResolverImpl {
        ResolverImpl::new(PLACEMENTS.to_string())
    }

    #[test]
    fn test_local_placement_chain() {
        let resolver = resolver();
        let placement = resolver.get(EntityId(8)).unwrap();
        let m = local_placement(&placement, &resolver);

        // Local X is world Y, then offset (0,5,1), then parent offset (10,0,0)
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(10.0, 6.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_transformation_operator_scales() {
        let resolver = resolver();
        let operator = resolver.get(EntityId(9)).unwrap();
        let m = placement_matrix(&operator, &resolver);
        let p = m.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(12.0, 2.0, 2.0), epsilon = 1e-9);
    }

    #[test]
    fn test_axis2_placement_2d() {
        let resolver = resolver();
        let placement = resolver.get(EntityId(11)).unwrap();
        let m = axis2_placement_2d(&placement, &resolver);
        let p = m.transform_point(&Point2::new(1.0, 1.0));
        assert_relative_eq!(p, Point2::new(2.0, 3.0), epsilon = 1e-9);
    }
}
