use crate::{Shape, SurfacePoint};
use geometry::bbox::BBox;
use geometry::ray::Ray;
use geometry::{AffineTransform, BuildError, Interaction, Transform};
use math::float::barycentric_lerp;
use math::hcm::{Point3, Vec3};
use std::sync::Arc;

/// Determinants below this magnitude mean the ray is parallel to the triangle, or the triangle
/// is degenerate.
const DET_EPSILON: f32 = 1e-12;

/// Indexed triangle mesh with world-space vertex attributes. Per-vertex normals and uvs are
/// optional; an empty attribute vector means the attribute is absent.
#[derive(Debug)]
pub struct TriangleMesh {
    positions: Vec<Point3>,
    normals: Vec<Vec3>,
    uvs: Vec<(f32, f32)>,
    indices: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Builds the mesh, transforming positions and normals into world space.
    pub fn new(
        to_world: AffineTransform, positions: Vec<Point3>, indices: Vec<[usize; 3]>,
        normals: Vec<Vec3>, uvs: Vec<(f32, f32)>,
    ) -> Result<Arc<Self>, BuildError> {
        let count = positions.len();
        if let Some(index) = indices.iter().flatten().copied().find(|i| *i >= count) {
            return Err(BuildError::VertexOutOfRange { index, count });
        }
        for (attribute, actual) in [("normals", normals.len()), ("uvs", uvs.len())] {
            if actual != 0 && actual != count {
                return Err(BuildError::AttributeCountMismatch {
                    attribute,
                    expected: count,
                    actual,
                });
            }
        }
        if positions.iter().any(|p| p.has_nan()) {
            return Err(BuildError::invalid("positions", "contains NaN"));
        }
        Ok(Arc::new(Self {
            positions: positions.into_iter().map(|p| to_world.apply(p)).collect(),
            normals: normals
                .into_iter()
                .map(|n| to_world.apply_normal(n).try_hat().unwrap_or(Vec3::ZERO))
                .collect(),
            uvs,
            indices,
        }))
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// Splits the mesh into individual triangle shapes that share the mesh data.
    pub fn triangles(self: &Arc<Self>) -> Vec<Triangle> {
        (0..self.indices.len())
            .map(|index| Triangle {
                mesh: self.clone(),
                index,
            })
            .collect()
    }
}

/// One triangle of a [`TriangleMesh`].
#[derive(Debug, Clone)]
pub struct Triangle {
    mesh: Arc<TriangleMesh>,
    index: usize,
}

impl Triangle {
    /// Makes a standalone triangle from three world-space points.
    pub fn from_points(p0: Point3, p1: Point3, p2: Point3) -> Result<Triangle, BuildError> {
        let mesh = TriangleMesh::new(
            AffineTransform::identity(),
            vec![p0, p1, p2],
            vec![[0, 1, 2]],
            vec![],
            vec![],
        )?;
        Ok(Triangle { mesh, index: 0 })
    }

    fn vertex_indices(&self) -> [usize; 3] {
        self.mesh.indices[self.index]
    }

    pub fn positions(&self) -> (Point3, Point3, Point3) {
        let [i, j, k] = self.vertex_indices();
        let p = &self.mesh.positions;
        (p[i], p[j], p[k])
    }

    fn uvs(&self) -> [(f32, f32); 3] {
        if self.mesh.uvs.is_empty() {
            [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]
        } else {
            self.vertex_indices().map(|i| self.mesh.uvs[i])
        }
    }

    /// Builds the interaction at the point with barycentric coordinates `(b1, b2)` relative to
    /// the 2nd and 3rd vertex.
    fn interaction_at(&self, (b1, b2): (f32, f32), ray_t: f32, wo: Vec3) -> Interaction {
        let (p0, p1, p2) = self.positions();
        let b0 = 1.0 - b1 - b2;
        let pos = barycentric_lerp((p0, p1, p2), (b0, b1, b2));
        let [uv0, uv1, uv2] = self.uvs();
        let uv = (
            b0 * uv0.0 + b1 * uv1.0 + b2 * uv2.0,
            b0 * uv0.1 + b1 * uv1.1 + b2 * uv2.1,
        );

        let (e1, e2) = (p1 - p0, p2 - p0);
        // Solves dp/du from the uv parameterization; falls back to an edge if it is degenerate.
        let (du1, dv1) = (uv1.0 - uv0.0, uv1.1 - uv0.1);
        let (du2, dv2) = (uv2.0 - uv0.0, uv2.1 - uv0.1);
        let uv_det = du1 * dv2 - dv1 * du2;
        let dpdu = if uv_det.abs() < 1e-9 {
            e1
        } else {
            (e1 * dv2 - e2 * dv1) * uv_det.recip()
        };

        let mut normal = e1.cross(e2).hat();
        if self.mesh.normals.is_empty() {
            return Interaction::new(pos, ray_t, uv, normal, wo).with_dpdu(dpdu);
        }
        let [i, j, k] = self.vertex_indices();
        let n = &self.mesh.normals;
        let shading_normal = n[i] * b0 + n[j] * b1 + n[k] * b2;
        match shading_normal.try_hat() {
            Some(ns) => {
                // The geometric normal follows the orientation given by the vertex normals.
                if normal.dot(ns) < 0.0 {
                    normal = -normal;
                }
                Interaction::new(pos, ray_t, uv, normal, wo).with_shading_frame(ns, dpdu)
            }
            None => Interaction::new(pos, ray_t, uv, normal, wo).with_dpdu(dpdu),
        }
    }
}

impl Shape for Triangle {
    fn summary(&self) -> String {
        let (p0, p1, p2) = self.positions();
        format!("Triangle{{ {}, {}, {} }}", p0, p1, p2)
    }

    fn bbox(&self) -> BBox {
        let (p0, p1, p2) = self.positions();
        BBox::new(p0, p1).union(p2)
    }

    /// Möller-Trumbore ray-triangle intersection. The resulting uv are the barycentric
    /// coordinates of the 2nd and 3rd vertex: `p = p0 + u*(p1-p0) + v*(p2-p0)`.
    /// Points on the edges and vertices are accepted.
    fn intersect(&self, r: &Ray) -> Option<SurfacePoint> {
        let (p0, p1, p2) = self.positions();
        let (e1, e2) = (p1 - p0, p2 - p0);
        let pvec = r.dir.cross(e2);
        let det = e1.dot(pvec);
        if det.abs() < DET_EPSILON {
            return None;
        }
        let inv_det = det.recip();
        let tvec = r.origin - p0;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let qvec = tvec.cross(e1);
        let v = r.dir.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = r.truncated_t(e2.dot(qvec) * inv_det)?;
        Some(SurfacePoint { t, uv: (u, v) })
    }

    fn interaction(&self, r: &Ray, hit: &SurfacePoint) -> Interaction {
        self.interaction_at(hit.uv, hit.t, -r.dir.hat())
    }

    fn area(&self) -> f32 {
        let (p0, p1, p2) = self.positions();
        0.5 * (p1 - p0).cross(p2 - p0).norm()
    }

    fn sample(&self, (u, v): (f32, f32)) -> (Interaction, f32) {
        // Uniform barycentrics by folding the square: b0 = 1 - sqrt(u), b1 = v * sqrt(u).
        let su = u.sqrt();
        let (b1, b2) = ((1.0 - v) * su, v * su);
        let point = self.interaction_at((b1, b2), f32::INFINITY, Vec3::ZERO);
        (point, self.area().recip())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mesh_validation() {
        let positions = vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        let bad_index = TriangleMesh::new(
            AffineTransform::identity(),
            positions.clone(),
            vec![[0, 1, 3]],
            vec![],
            vec![],
        );
        assert_eq!(
            bad_index.unwrap_err(),
            BuildError::VertexOutOfRange { index: 3, count: 3 }
        );
        let bad_normals = TriangleMesh::new(
            AffineTransform::identity(),
            positions.clone(),
            vec![[0, 1, 2]],
            vec![Vec3::Z],
            vec![],
        );
        assert!(matches!(
            bad_normals.unwrap_err(),
            BuildError::AttributeCountMismatch { attribute: "normals", .. }
        ));
        let mesh = TriangleMesh::new(
            AffineTransform::translater(Vec3::new(0.0, 0.0, 2.0)),
            positions,
            vec![[0, 1, 2]],
            vec![],
            vec![],
        )
        .unwrap();
        let triangles = mesh.triangles();
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0].positions().2, Point3::new(0.0, 1.0, 2.0));
        assert!((triangles[0].area() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn interpolated_normal_orients_geometric_normal() {
        let mesh = TriangleMesh::new(
            AffineTransform::identity(),
            vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![[0, 1, 2]],
            vec![-Vec3::Z; 3],
            vec![],
        )
        .unwrap();
        let tri = &mesh.triangles()[0];
        let ray = Ray::new(Point3::new(0.2, 0.2, 1.0), -Vec3::Z);
        let hit = tri.intersect(&ray).unwrap();
        let isect = tri.interaction(&ray, &hit);
        assert_eq!(isect.normal, -Vec3::Z);
        assert!((isect.shading_normal() + Vec3::Z).norm() < 1e-6);
        assert!(isect.has_valid_frame());
    }
}
