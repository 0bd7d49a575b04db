//! Cross-module properties of the three query visitors: brute-force cross
//! checks, differential runs with pruning disabled, and the cube and
//! single-tet scenarios.

use approx::assert_relative_eq;
use lattice_bvh::geom::point_on_triangle;
use lattice_bvh::{
    Aabb, Bvh, Descent, NearestTriangleTraverse, PointInTetMeshTraverse,
    PointInTriangleMeshTraverse, QueryConfig, TetMesh, Traverser, TriMesh, WatertightRay,
};
use lattice_math::{narrow_point, Point3, Vec3};
use proptest::prelude::*;

const GRID: usize = 3;

const PERMS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// Unit cube split into `n^3` cells of six Kuhn tets each.
///
/// Tet `6 * cell + perm` walks from the cell's low corner to its high corner
/// along the axis order `PERMS[perm]`.
fn kuhn_grid(n: usize) -> (Vec<[f64; 3]>, Vec<[u32; 4]>) {
    let side = n + 1;
    let index = |i: usize, j: usize, k: usize| (i + side * (j + side * k)) as u32;

    let mut verts = Vec::with_capacity(side * side * side);
    for k in 0..side {
        for j in 0..side {
            for i in 0..side {
                verts.push([i as f64 / n as f64, j as f64 / n as f64, k as f64 / n as f64]);
            }
        }
    }

    let mut tets = Vec::with_capacity(n * n * n * 6);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                for perm in PERMS {
                    let mut c = [i, j, k];
                    let mut tet = [index(c[0], c[1], c[2]); 4];
                    for (step, &axis) in perm.iter().enumerate() {
                        c[axis] += 1;
                        tet[step + 1] = index(c[0], c[1], c[2]);
                    }
                    tets.push(tet);
                }
            }
        }
    }
    (verts, tets)
}

fn cell_tet(cell: (usize, usize, usize), perm: usize) -> usize {
    let (i, j, k) = cell;
    (i + GRID * (j + GRID * k)) * 6 + perm
}

/// Closed convex polyhedron inscribed in the unit sphere.
fn uv_sphere(rings: usize, segments: usize) -> (Vec<[f64; 3]>, Vec<[u32; 3]>) {
    let mut verts = vec![[0.0, 0.0, 1.0], [0.0, 0.0, -1.0]];
    for r in 1..rings {
        let theta = std::f64::consts::PI * r as f64 / rings as f64;
        for s in 0..segments {
            let phi = std::f64::consts::TAU * s as f64 / segments as f64;
            verts.push([theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()]);
        }
    }

    let ring = |r: usize, s: usize| (2 + (r - 1) * segments + s % segments) as u32;
    let mut tris = Vec::new();
    for s in 0..segments {
        tris.push([0, ring(1, s), ring(1, s + 1)]);
        tris.push([1, ring(rings - 1, s + 1), ring(rings - 1, s)]);
        for r in 1..rings - 1 {
            let (a, b, c, d) = (ring(r, s), ring(r + 1, s), ring(r + 1, s + 1), ring(r, s + 1));
            tris.push([a, b, c]);
            tris.push([a, c, d]);
        }
    }
    (verts, tris)
}

/// Largest signed distance from `p` to the face planes of a convex mesh
/// centered on the origin. Negative means strictly inside.
fn convex_signed_distance(mesh: &TriMesh<'_, f64>, p: &Point3<f64>) -> f64 {
    (0..mesh.len())
        .map(|i| {
            let [a, b, c] = mesh.tri_points(i);
            let mut n = (b - a).cross(&(c - a)).normalize();
            if n.dot(&a.coords) < 0.0 {
                n = -n;
            }
            n.dot(&(p - a))
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Unit cube, 12 outward-wound triangles.
fn cube() -> (Vec<[f64; 3]>, Vec<[u32; 3]>) {
    let verts = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let tris = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 3, 7],
        [2, 7, 6],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    (verts, tris)
}

fn brute_nearest(mesh: &TriMesh<'_, f64>, p: &Point3<f64>, skip: &[u32]) -> f64 {
    (0..mesh.len())
        .filter(|&i| !mesh.tri(i).iter().any(|v| skip.contains(v)))
        .map(|i| {
            let [a, b, c] = mesh.tri_points(i);
            (p - point_on_triangle(p, &a, &b, &c)).norm()
        })
        .fold(f64::INFINITY, f64::min)
}

fn brute_ray_prims(mesh: &TriMesh<'_, f64>, ray: &WatertightRay, skip: &[u32]) -> Vec<usize> {
    (0..mesh.len())
        .filter(|&i| !mesh.tri(i).iter().any(|v| skip.contains(v)))
        .filter(|&i| {
            let [q0, q1, q2] = mesh.tri_points(i).map(|p| narrow_point(&p));
            ray.intersect_triangle(&q0, &q1, &q2).is_some()
        })
        .collect()
}

fn sorted_prims(v: &PointInTriangleMeshTraverse<'_, f64>) -> Vec<usize> {
    let mut prims: Vec<usize> = v.output.hits.iter().map(|h| h.prim).collect();
    prims.sort_unstable();
    prims
}

/// Records the best distance after every leaf.
struct DistanceLog<'a> {
    inner: NearestTriangleTraverse<'a, f64>,
    history: Vec<f64>,
}

impl Traverser<f64> for DistanceLog<'_> {
    fn traverse(&self, left: &Aabb<f64>, right: &Aabb<f64>) -> Descent {
        self.inner.traverse(left, right)
    }

    fn stop_traversing(&mut self, aabb: &Aabb<f64>, prim: usize) -> bool {
        let stop = self.inner.stop_traversing(aabb, prim);
        self.history.push(self.inner.output.dist);
        stop
    }
}

fn point_strategy() -> impl Strategy<Value = Point3<f64>> {
    (-1.5f64..1.5, -1.5f64..1.5, -1.5f64..1.5).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

fn direction_strategy() -> impl Strategy<Value = Vec3<f64>> {
    (-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0)
        .prop_map(|(x, y, z)| Vec3::new(x, y, z))
        .prop_filter("direction too short", |d| d.norm() > 0.1)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn tet_strictly_inside_is_found(
        cell in (0..GRID, 0..GRID, 0..GRID),
        perm in 0..6usize,
        w in prop::array::uniform4(0.01f64..1.0),
    ) {
        let (verts, tets) = kuhn_grid(GRID);
        let mesh = TetMesh::new(&verts, &tets).unwrap();
        let tree = Bvh::build(&mesh.prim_boxes(1e-12));

        let expected = cell_tet(cell, perm);
        let sum: f64 = w.iter().sum();
        let pts = mesh.tet_points(expected);
        let mut acc = Vec3::zeros();
        for (p, wi) in pts.iter().zip(w) {
            acc += p.coords * (wi / sum);
        }
        let p = Point3::from(acc);

        let mut v = PointInTetMeshTraverse::new(p, mesh);
        prop_assert!(tree.traverse(&mut v));
        prop_assert_eq!(v.output.prim, Some(expected));

        // Skipping the only containing tet leaves nothing to find.
        let skip = [expected];
        let mut v = PointInTetMeshTraverse::with_skips(p, mesh, &[], &skip);
        prop_assert!(!tree.traverse(&mut v));
        prop_assert!(!v.output.found());
    }

    #[test]
    fn tet_outside_hull_is_not_found(p in point_strategy()) {
        let (verts, tets) = kuhn_grid(GRID);
        let mesh = TetMesh::new(&verts, &tets).unwrap();
        let tree = Bvh::build(&mesh.prim_boxes(1e-12));

        let margin = 1e-6;
        let outside = [p.x, p.y, p.z].iter().any(|&c| c < -margin || c > 1.0 + margin);
        let inside = [p.x, p.y, p.z].iter().all(|&c| c > margin && c < 1.0 - margin);

        let mut v = PointInTetMeshTraverse::new(p, mesh);
        let found = tree.traverse(&mut v);
        if outside {
            prop_assert!(!found);
        }
        if inside {
            prop_assert!(found);
        }
    }

    #[test]
    fn tet_skips_are_never_returned(
        p in point_strategy(),
        skip_verts in prop::collection::vec(0u32..64, 0..6),
        skip_tets in prop::collection::vec(0usize..162, 0..20),
    ) {
        let (verts, tets) = kuhn_grid(GRID);
        let mesh = TetMesh::new(&verts, &tets).unwrap();
        let tree = Bvh::build(&mesh.prim_boxes(1e-12));

        let mut pruned = PointInTetMeshTraverse::with_skips(p, mesh, &skip_verts, &skip_tets);
        tree.traverse(&mut pruned);
        if let Some(prim) = pruned.output.prim {
            prop_assert!(!skip_tets.contains(&prim));
            prop_assert!(!mesh.tet(prim).iter().any(|v| skip_verts.contains(v)));
        }

        let mut full = PointInTetMeshTraverse::with_skips(p, mesh, &skip_verts, &skip_tets);
        tree.traverse_exhaustive(&mut full);
        prop_assert_eq!(pruned.output.found(), full.output.found());
    }

    #[test]
    fn ray_parity_on_convex_mesh(p in point_strategy(), dir in direction_strategy()) {
        let (verts, tris) = uv_sphere(6, 10);
        let mesh = TriMesh::new(&verts, &tris).unwrap();
        let tree = Bvh::build(&mesh.prim_boxes(1e-12));

        let sd = convex_signed_distance(&mesh, &p);
        prop_assume!(sd.abs() > 1e-4);

        let mut v = PointInTriangleMeshTraverse::new(p, mesh).with_direction(dir).unwrap();
        prop_assert!(!tree.traverse(&mut v));
        prop_assert_eq!(v.output.is_inside(), sd < 0.0);
        prop_assert!(v.output.hits.iter().all(|h| h.t >= 0.0));
    }

    #[test]
    fn ray_hits_match_brute_force(
        p in point_strategy(),
        dir in direction_strategy(),
        skip in prop::collection::vec(0u32..52, 0..4),
    ) {
        let (verts, tris) = uv_sphere(6, 10);
        let mesh = TriMesh::new(&verts, &tris).unwrap();
        let tree = Bvh::build(&mesh.prim_boxes(1e-12));

        let mut pruned = PointInTriangleMeshTraverse::with_skips(p, mesh, &skip)
            .with_direction(dir)
            .unwrap();
        tree.traverse(&mut pruned);
        let mut full = PointInTriangleMeshTraverse::with_skips(p, mesh, &skip)
            .with_direction(dir)
            .unwrap();
        tree.traverse_exhaustive(&mut full);

        for h in &pruned.output.hits {
            prop_assert!(h.t >= 0.0);
            prop_assert!(!mesh.tri(h.prim).iter().any(|v| skip.contains(v)));
        }

        let ray = WatertightRay::new(&pruned.ray().origin, &pruned.ray().direction);
        let expected = brute_ray_prims(&mesh, &ray, &skip);
        prop_assert_eq!(sorted_prims(&pruned), expected);
        prop_assert_eq!(sorted_prims(&pruned), sorted_prims(&full));
    }

    #[test]
    fn nearest_matches_brute_force(
        p in point_strategy(),
        skip in prop::collection::vec(0u32..52, 0..4),
    ) {
        let (verts, tris) = uv_sphere(6, 10);
        let mesh = TriMesh::new(&verts, &tris).unwrap();
        let tree = Bvh::build(&mesh.prim_boxes(1e-12));

        let mut logged = DistanceLog {
            inner: NearestTriangleTraverse::with_skips(p, mesh, &skip),
            history: Vec::new(),
        };
        prop_assert!(!tree.traverse(&mut logged));
        for pair in logged.history.windows(2) {
            prop_assert!(pair[1] <= pair[0]);
        }

        let expected = brute_nearest(&mesh, &p, &skip);
        let got = logged.inner.output;
        if expected.is_finite() {
            prop_assert!((got.dist - expected).abs() <= 1e-12);
            prop_assert!(((p - got.point_on_tri).norm() - got.dist).abs() <= 1e-12);
        } else {
            prop_assert!(got.prim.is_none());
        }

        let mut full = NearestTriangleTraverse::with_skips(p, mesh, &skip);
        tree.traverse_exhaustive(&mut full);
        prop_assert_eq!(full.output.dist, got.dist);
    }
}

#[test]
fn test_nearest_on_every_vertex() {
    let (verts, tris) = uv_sphere(6, 10);
    let mesh = TriMesh::new(&verts, &tris).unwrap();
    let tree = Bvh::build(&mesh.prim_boxes(1e-12));

    for row in &verts {
        let p = Point3::new(row[0], row[1], row[2]);
        let mut v = NearestTriangleTraverse::new(p, mesh);
        tree.traverse(&mut v);
        assert_eq!(v.output.dist, 0.0);
        assert_eq!(v.output.point_on_tri, p);
    }
}

#[test]
fn test_unit_cube_scenario() {
    let (verts, tris) = cube();
    let mesh = TriMesh::new(&verts, &tris).unwrap();
    let tree = Bvh::build(&mesh.prim_boxes(1e-12));
    let center = Point3::new(0.5, 0.5, 0.5);

    let mut nearest = NearestTriangleTraverse::new(center, mesh);
    tree.traverse(&mut nearest);
    assert_relative_eq!(nearest.output.dist, 0.5, epsilon = 1e-12);

    // The +Z ray meets the top face exactly on the diagonal both top
    // triangles share, and each of them reports it.
    let mut ray = PointInTriangleMeshTraverse::new(center, mesh);
    tree.traverse(&mut ray);
    assert_eq!(ray.output.count(), 2);
    assert_eq!(sorted_prims(&ray), vec![2, 3]);
    assert!(ray.output.hits.iter().all(|h| h.t == 0.5));
}

#[test]
fn test_single_tet_scenario() {
    let verts = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];
    let tets = [[0, 1, 2, 3]];
    let mesh = TetMesh::new(&verts, &tets).unwrap();
    let tree = Bvh::build(&mesh.prim_boxes(1e-12));

    let mut v = PointInTetMeshTraverse::new(Point3::new(0.1, 0.1, 0.1), mesh);
    assert!(tree.traverse(&mut v));
    assert_eq!(v.output.prim, Some(0));

    let mut v = PointInTetMeshTraverse::new(Point3::new(2.0, 2.0, 2.0), mesh);
    assert!(!tree.traverse(&mut v));
    assert!(!v.output.found());
}

#[test]
fn test_refit_follows_deformation() {
    let (verts, tets) = kuhn_grid(GRID);
    let mesh = TetMesh::new(&verts, &tets).unwrap();
    let mut tree = Bvh::build(&mesh.prim_boxes(1e-12));

    // Stretch along X and refit instead of rebuilding.
    let moved: Vec<[f64; 3]> = verts.iter().map(|v| [v[0] * 3.0, v[1], v[2]]).collect();
    let moved_mesh = TetMesh::new(&moved, &tets).unwrap();
    tree.refit(&moved_mesh.prim_boxes(1e-12)).unwrap();

    let mut v = PointInTetMeshTraverse::new(Point3::new(2.5, 0.5, 0.5), moved_mesh);
    assert!(tree.traverse(&mut v));
    let mut v = PointInTetMeshTraverse::new(Point3::new(3.5, 0.5, 0.5), moved_mesh);
    assert!(!tree.traverse(&mut v));
}

#[test]
fn test_config_driven_queries() {
    let config = QueryConfig::from_toml(
        r#"
        ray_direction = [1.0, 0.0, 0.0]
        box_padding = 1e-9
        "#,
    )
    .unwrap();

    let (verts, tris) = cube();
    let mesh = TriMesh::new(&verts, &tris).unwrap();
    let tree = Bvh::build_with_config(&mesh.prim_boxes(config.padding()), &config);

    let mut v = PointInTriangleMeshTraverse::new(Point3::new(0.3, 0.6, 0.4), mesh)
        .with_direction(config.direction())
        .unwrap();
    tree.traverse(&mut v);
    assert_eq!(v.output.count(), 1);
    assert_eq!(v.output.hits[0].prim, 10);
}

#[test]
fn test_single_precision_queries() {
    let (verts, tris) = cube();
    let verts: Vec<[f32; 3]> = verts
        .iter()
        .map(|v| [v[0] as f32, v[1] as f32, v[2] as f32])
        .collect();
    let mesh = TriMesh::new(&verts, &tris).unwrap();
    let tree = Bvh::build(&mesh.prim_boxes(1e-6));

    let p = Point3::new(0.3f32, 0.6, 0.4);
    let mut nearest = NearestTriangleTraverse::new(p, mesh);
    tree.traverse(&mut nearest);
    assert!((nearest.output.dist - 0.3).abs() < 1e-6);

    let mut ray = PointInTriangleMeshTraverse::new(p, mesh);
    tree.traverse(&mut ray);
    assert!(ray.output.is_inside());
}
