use super::*;
use crate::mesh::{Mesh, Vertex};
use glam::Vec3;

// ============================================================================
// Helpers
// ============================================================================

/// Flat grid of `n` x `n` quads in the XZ plane, two CCW triangles per quad
/// (normals facing +Y).
fn grid_mesh(n: u32) -> Mesh {
    let mut vertices = Vec::new();
    for z in 0..=n {
        for x in 0..=n {
            vertices.push(Vertex::new(Vec3::new(x as f32, 0.0, z as f32), Vec3::Y));
        }
    }
    let row = n + 1;
    let mut indices = Vec::new();
    for z in 0..n {
        for x in 0..n {
            let i0 = z * row + x;
            let i1 = i0 + 1;
            let i2 = i0 + row;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }
    Mesh::new(vertices, indices)
}

/// `count` disjoint triangles sharing no vertices
fn triangle_soup(count: u32) -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for t in 0..count {
        let x = t as f32 * 3.0;
        vertices.push(Vertex::new(Vec3::new(x, 0.0, 0.0), Vec3::Z));
        vertices.push(Vertex::new(Vec3::new(x + 1.0, 0.0, 0.0), Vec3::Z));
        vertices.push(Vertex::new(Vec3::new(x, 1.0, 0.0), Vec3::Z));
        indices.extend_from_slice(&[t * 3, t * 3 + 1, t * 3 + 2]);
    }
    Mesh::new(vertices, indices)
}

/// Global triangles reconstructed from a meshlet mesh, each sorted, whole list sorted
fn global_triangles(mm: &MeshletMesh) -> Vec<[u32; 3]> {
    let mut result = Vec::new();
    for m in mm.meshlets() {
        let verts = &mm.meshlet_vertices()[m.vertex_offset as usize..(m.vertex_offset + m.vertex_count) as usize];
        let tris = &mm.meshlet_triangles()[m.triangle_offset as usize..(m.triangle_offset + m.triangle_count * 3) as usize];
        for t in tris.chunks_exact(3) {
            let mut tri = [verts[t[0] as usize], verts[t[1] as usize], verts[t[2] as usize]];
            tri.sort_unstable();
            result.push(tri);
        }
    }
    result.sort_unstable();
    result
}

fn source_triangles(indices: &[u32]) -> Vec<[u32; 3]> {
    let mut result: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|t| {
            let mut tri = [t[0], t[1], t[2]];
            tri.sort_unstable();
            tri
        })
        .collect();
    result.sort_unstable();
    result
}

// ============================================================================
// Bound
// ============================================================================

#[test]
fn test_build_meshlets_bound() {
    // 100 triangles: vertex-limited (300 + 61) / 62 = 5, triangle-limited 1
    assert_eq!(build_meshlets_bound(300, 64, 124), 5);
    // 1000 triangles at 10 per meshlet
    assert_eq!(build_meshlets_bound(3000, 256, 10), 100);
    assert_eq!(build_meshlets_bound(3, 3, 1), 3);
}

// ============================================================================
// Build
// ============================================================================

#[test]
fn test_locality_invariant() {
    let mut mesh = grid_mesh(20);
    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::new(64, 124)).unwrap();

    for m in mm.meshlets() {
        let tris = &mm.meshlet_triangles()[m.triangle_offset as usize..(m.triangle_offset + m.triangle_count * 3) as usize];
        for &local in tris {
            assert!((local as u32) < m.vertex_count, "local index {} >= {}", local, m.vertex_count);
        }
    }
}

#[test]
fn test_limits_respected() {
    let mut mesh = grid_mesh(16);
    let limits = MeshletLimits::new(32, 20);
    let mm = MeshletMesh::build(&mut mesh, limits).unwrap();

    assert!(mm.meshlet_count() > 1);
    for m in mm.meshlets() {
        assert!(m.vertex_count <= limits.max_vertices);
        assert!(m.triangle_count <= limits.max_triangles);
        assert!(m.triangle_count > 0);
    }
}

#[test]
fn test_every_triangle_emitted_exactly_once() {
    let mut mesh = grid_mesh(12);
    let expected = source_triangles(&mesh.indices);
    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::new(64, 124)).unwrap();
    assert_eq!(global_triangles(&mm), expected);
}

#[test]
fn test_vertex_sum_covers_distinct_vertices() {
    let mut mesh = grid_mesh(10);
    let mut distinct = mesh.indices.clone();
    distinct.sort_unstable();
    distinct.dedup();

    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::new(16, 16)).unwrap();
    let sum: u32 = mm.meshlets().iter().map(|m| m.vertex_count).sum();
    assert!(sum as usize >= distinct.len());
}

#[test]
fn test_trimmed_sizes_are_exact() {
    // 8 x 8 grid: 128 triangles, 384 indices
    let mut mesh = grid_mesh(8);
    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::new(64, 124)).unwrap();
    let last = *mm.meshlets().last().unwrap();

    assert_eq!(mm.meshlets_vertex_count(), (last.vertex_offset + last.vertex_count) as usize);
    assert_eq!(mm.meshlet_vertices().len(), mm.meshlets_vertex_count());

    assert_eq!(mm.meshlets_triangle_count(), (last.triangle_offset + last.triangle_count * 3) as usize);
    assert_eq!(mm.meshlet_triangles().len(), mm.meshlets_triangle_count());
    // No padding between meshlets: the triangle pool holds every index once
    assert_eq!(mm.meshlets_triangle_count(), 384);
}

#[test]
fn test_offsets_are_contiguous() {
    let mut mesh = grid_mesh(10);
    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::new(24, 32)).unwrap();
    let mut vertex_offset = 0;
    let mut triangle_offset = 0;
    for m in mm.meshlets() {
        assert_eq!(m.vertex_offset, vertex_offset);
        assert_eq!(m.triangle_offset, triangle_offset);
        vertex_offset += m.vertex_count;
        triangle_offset += m.triangle_count * 3;
    }
}

#[test]
fn test_triangle_limit_splits_soup() {
    let mut mesh = triangle_soup(10);
    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::new(64, 4)).unwrap();
    assert!(mm.meshlet_count() >= 3);
    assert!(mm.meshlets().iter().all(|m| m.triangle_count <= 4));
    let total: u32 = mm.meshlets().iter().map(|m| m.triangle_count).sum();
    assert_eq!(total, 10);
}

#[test]
fn test_vertex_limit_splits_soup() {
    // 3 vertices per triangle, 7 vertices per meshlet -> 2 triangles per meshlet
    let mut mesh = triangle_soup(5);
    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::new(7, 8)).unwrap();
    assert!(mm.meshlet_count() >= 3);
    assert!(mm.meshlets().iter().all(|m| m.vertex_count <= 7 && m.triangle_count <= 2));
    assert_eq!(mm.meshlets_vertex_count(), 15);
}

#[test]
fn test_single_triangle() {
    let mut mesh = triangle_soup(1);
    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::default()).unwrap();
    assert_eq!(mm.meshlet_count(), 1);
    assert_eq!(mm.meshlets()[0], Meshlet { vertex_offset: 0, triangle_offset: 0, vertex_count: 3, triangle_count: 1 });
    assert_eq!(mm.meshlet_triangles_u32(), vec![0, 1, 2]);
}

#[test]
fn test_source_mesh_moved() {
    let mut mesh = grid_mesh(4);
    let vertex_count = mesh.vertex_count();
    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::default()).unwrap();

    assert!(mesh.is_empty());
    assert_eq!(mesh.vertex_count(), 0);
    assert_eq!(mesh.index_count(), 0);
    assert_eq!(mm.mesh().vertex_count(), vertex_count);
    assert_eq!(mm.bounds().len(), mm.meshlet_count());
}

#[test]
fn test_deterministic() {
    let mut a = grid_mesh(9);
    let mut b = grid_mesh(9);
    let ma = MeshletMesh::build(&mut a, MeshletLimits::new(32, 32)).unwrap();
    let mb = MeshletMesh::build(&mut b, MeshletLimits::new(32, 32)).unwrap();
    assert_eq!(ma.meshlets(), mb.meshlets());
    assert_eq!(ma.meshlet_vertices(), mb.meshlet_vertices());
    assert_eq!(ma.meshlet_triangles(), mb.meshlet_triangles());
}

// ============================================================================
// Build errors
// ============================================================================

#[test]
fn test_empty_indices_rejected() {
    let mut mesh = Mesh::new(vec![Vertex::default(); 3], Vec::new());
    assert!(matches!(MeshletMesh::build(&mut mesh, MeshletLimits::default()), Err(Error::InvalidResource(_))));
    // Failure leaves the mesh in place
    assert_eq!(mesh.vertex_count(), 3);
}

#[test]
fn test_partial_triangle_rejected() {
    let mut mesh = Mesh::new(vec![Vertex::default(); 3], vec![0, 1]);
    assert!(MeshletMesh::build(&mut mesh, MeshletLimits::default()).is_err());
}

#[test]
fn test_out_of_range_index_rejected() {
    let mut mesh = Mesh::new(vec![Vertex::default(); 3], vec![0, 1, 3]);
    assert!(MeshletMesh::build(&mut mesh, MeshletLimits::default()).is_err());
}

#[test]
fn test_invalid_limits_rejected() {
    let mut mesh = triangle_soup(1);
    assert!(MeshletMesh::build(&mut mesh, MeshletLimits::new(2, 10)).is_err());
    assert!(MeshletMesh::build(&mut mesh, MeshletLimits::new(300, 10)).is_err());
    assert!(MeshletMesh::build(&mut mesh, MeshletLimits::new(257, 124)).is_err());
    assert!(MeshletMesh::build(&mut mesh, MeshletLimits::new(64, 0)).is_err());
    // Triangle limit must be a multiple of 4
    assert!(MeshletMesh::build(&mut mesh, MeshletLimits::new(64, 10)).is_err());
    assert_eq!(mesh.vertex_count(), 3);
}

#[test]
fn test_limits_from_device_clamped() {
    let limits = MeshletLimits::from_device(1024, 512);
    assert_eq!(limits, MeshletLimits::new(256, 256));
    assert_eq!(MeshletLimits::from_device(64, 126), MeshletLimits::new(64, 124));
    assert_eq!(MeshletLimits::from_device(256, 256), MeshletLimits::new(256, 256));
}

// ============================================================================
// Optimize
// ============================================================================

#[test]
fn test_optimize_orders_vertices_by_first_use() {
    let mut vertices = vec![10, 11, 12, 13];
    let mut triangles = vec![3, 2, 1, 1, 2, 0];
    optimize_meshlet(&mut vertices, &mut triangles);

    let mut next = 0u8;
    for &local in &triangles {
        assert!(local <= next);
        if local == next {
            next += 1;
        }
    }
    assert_eq!(next, 4);
}

#[test]
fn test_optimize_preserves_triangles() {
    let mesh = grid_mesh(6);
    let mm_before = {
        let mut copy = mesh.clone();
        MeshletMesh::build(&mut copy, MeshletLimits::new(64, 124)).unwrap()
    };
    let expected = source_triangles(&mesh.indices);

    // build already optimizes; optimizing again must not change membership
    let mut vertices = mm_before.meshlet_vertices().to_vec();
    let mut triangles = mm_before.meshlet_triangles().to_vec();
    for m in mm_before.meshlets() {
        optimize_meshlet(
            &mut vertices[m.vertex_offset as usize..(m.vertex_offset + m.vertex_count) as usize],
            &mut triangles[m.triangle_offset as usize..(m.triangle_offset + m.triangle_count * 3) as usize],
        );
    }

    let mut rebuilt = Vec::new();
    for m in mm_before.meshlets() {
        let verts = &vertices[m.vertex_offset as usize..(m.vertex_offset + m.vertex_count) as usize];
        let tris = &triangles[m.triangle_offset as usize..(m.triangle_offset + m.triangle_count * 3) as usize];
        for t in tris.chunks_exact(3) {
            let mut tri = [verts[t[0] as usize], verts[t[1] as usize], verts[t[2] as usize]];
            tri.sort_unstable();
            rebuilt.push(tri);
        }
    }
    rebuilt.sort_unstable();
    assert_eq!(rebuilt, expected);
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn test_flat_meshlet_cone_faces_normal() {
    let positions = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
    let bounds = compute_meshlet_bounds(&[0, 1, 2], &[0, 1, 2], &positions).unwrap();

    assert!((bounds.cone_axis - Vec3::Z).length() < 1e-4);
    assert!(bounds.cone_cutoff.abs() < 1e-3);
    assert!(bounds.radius > 0.0);

    // Seen from behind (-Z) it is back-facing, from the front it is not
    assert!(bounds.is_backfacing_from(Vec3::new(0.2, 0.2, -10.0)));
    assert!(!bounds.is_backfacing_from(Vec3::new(0.2, 0.2, 10.0)));
}

#[test]
fn test_opposing_triangles_never_cone_culled() {
    let positions = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
    // Same triangle with both windings: normals cancel
    let bounds = compute_meshlet_bounds(&[0, 1, 2], &[0, 1, 2, 0, 2, 1], &positions).unwrap();
    assert_eq!(bounds.cone_cutoff, 1.0);
    assert!(!bounds.is_backfacing_from(Vec3::new(0.0, 0.0, -10.0)));
}

#[test]
fn test_degenerate_meshlet_bounds() {
    let positions = vec![Vec3::ZERO, Vec3::ZERO, Vec3::ZERO];
    let bounds = compute_meshlet_bounds(&[0, 1, 2], &[0, 1, 2], &positions).unwrap();
    assert_eq!(bounds.cone_cutoff, 1.0);
    assert_eq!(bounds.radius, 0.0);
    // Zero axis with cutoff 1 is never back-facing
    assert!(!bounds.is_backfacing_from(Vec3::new(0.0, 0.0, -10.0)));
}

#[test]
fn test_bounds_reject_out_of_range_vertex() {
    let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
    assert!(matches!(
        compute_meshlet_bounds(&[0, 1, 3], &[0, 1, 2], &positions),
        Err(Error::InvalidResource(_))
    ));
    assert!(compute_meshlet_bounds(&[0, 1, 2], &[0, 1, 3], &positions).is_err());
}

#[test]
fn test_grid_bounds_enclose_meshlet_vertices() {
    let mut mesh = grid_mesh(8);
    let mm = MeshletMesh::build(&mut mesh, MeshletLimits::new(16, 16)).unwrap();
    for (m, b) in mm.meshlets().iter().zip(mm.bounds()) {
        for &v in &mm.meshlet_vertices()[m.vertex_offset as usize..(m.vertex_offset + m.vertex_count) as usize] {
            let p = mm.mesh().vertices[v as usize].position();
            assert!(p.distance(b.center) <= b.radius + 1e-4);
        }
        // Flat grid facing +Y: seen from below every meshlet is back-facing
        assert!(b.is_backfacing_from(b.center - Vec3::Y * 50.0));
    }
}
