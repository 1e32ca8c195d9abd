use super::*;
use glam::Vec3;

fn vertex(x: f32, y: f32, z: f32) -> Vertex {
    Vertex::new(Vec3::new(x, y, z), Vec3::Y)
}

// ============================================================================
// Generation
// ============================================================================

#[test]
fn test_generate_min_max() {
    let vertices = [vertex(0.0, 0.0, 0.0), vertex(1.0, 2.0, 3.0), vertex(-1.0, 0.0, 5.0)];
    let aabb = Aabb::generate(&vertices).unwrap();
    assert_eq!(aabb.min, Vec3::new(-1.0, 0.0, 0.0));
    assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 5.0));
}

#[test]
fn test_generate_single_vertex_is_degenerate_box() {
    let aabb = Aabb::generate(&[vertex(4.0, -2.0, 1.0)]).unwrap();
    assert_eq!(aabb.min, aabb.max);
}

#[test]
fn test_generate_empty_mesh_fails() {
    let result = Aabb::generate(&[]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// Corner order
// ============================================================================

#[test]
fn test_points_order() {
    let vertices = [vertex(0.0, 0.0, 0.0), vertex(1.0, 2.0, 3.0), vertex(-1.0, 0.0, 5.0)];
    let aabb = Aabb::generate(&vertices).unwrap();
    let points = aabb.points();

    assert_eq!(points[0], aabb.max);
    assert_eq!(points[4], aabb.min);
    assert_eq!(points[1], Vec3::new(1.0, 0.0, 5.0));
    assert_eq!(points[2], Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(points[3], Vec3::new(1.0, 2.0, 0.0));
    assert_eq!(points[5], Vec3::new(-1.0, 2.0, 5.0));
    assert_eq!(points[6], Vec3::new(-1.0, 0.0, 5.0));
    assert_eq!(points[7], Vec3::new(-1.0, 2.0, 0.0));
}

#[test]
fn test_points_are_all_distinct_for_non_flat_box() {
    let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
    let points = aabb.points();
    for i in 0..8 {
        for j in (i + 1)..8 {
            assert_ne!(points[i], points[j], "corners {} and {} collide", i, j);
        }
    }
}

#[test]
fn test_points_homogeneous_w_is_one() {
    let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    assert!(aabb.points_homogeneous().iter().all(|p| p[3] == 1.0));
}

