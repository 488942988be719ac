use std::{fs, path::Path};

use indexmap::IndexMap;
use itertools::{Itertools as _, MinMaxResult};
use log::warn;
use ordered_float::OrderedFloat;
use thiserror::Error;

use crate::{
    geometry::{EPSILON, FloatType, SlabHit, TexturePoint, Triangle, WorldBox, WorldPoint, WorldVector},
    scene::Shape,
};

/// Per-vertex data of the model.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexData {
    pub pos: WorldPoint,
    pub tex: TexturePoint,
    /// Zero when the model has no vertex normal here.
    pub normal: WorldVector,
}

impl VertexData {
    pub fn at(pos: WorldPoint) -> Self {
        VertexData {
            pos,
            tex: TexturePoint::origin(),
            normal: WorldVector::zeros(),
        }
    }
}

/// Triangle mesh. Faces are the triangle indices.
///
/// Meshes are not required to be closed, so they are treated as surfaces. A ray gets a hit
/// for every triangle it crosses.
#[derive(Clone, Debug)]
pub struct Mesh {
    triangles: Vec<Triangle<usize>>,
    vertices: Vec<VertexData>,
    bounds: WorldBox,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle<usize>>, vertices: Vec<VertexData>) -> Mesh {
        for t in &triangles {
            assert2::assert!(t.iter().all(|i| *i < vertices.len()));
        }
        let bounds = WorldBox::from_points(vertices.iter().map(|v| &v.pos));
        Mesh {
            triangles,
            vertices,
            bounds,
        }
    }

    pub fn with_obj(p: impl AsRef<Path>) -> Result<Mesh, MeshLoadError> {
        let content = fs::read_to_string(p)?;
        Self::from_obj_source(content)
    }

    pub fn from_obj_source(content: String) -> Result<Mesh, MeshLoadError> {
        let parsed = wavefront_obj::obj::parse(content)?;
        let (triangles, vertices) = Self::load_obj(parsed);
        Ok(Self::new(triangles, vertices))
    }

    fn load_obj(obj: wavefront_obj::obj::ObjSet) -> (Vec<Triangle<usize>>, Vec<VertexData>) {
        let mut triangles = Vec::new();
        let mut vertices = IndexMap::new();
        let mut skipped = 0usize;

        for (object_index, o) in obj.objects.into_iter().enumerate() {
            for geometry in o.geometry {
                for shape in geometry.shapes {
                    let wavefront_obj::obj::Primitive::Triangle(a, b, c) = shape.primitive else {
                        skipped += 1;
                        continue;
                    };

                    // Indices are only unique within one object
                    let mut handle_vertex = |vtindex: (usize, Option<usize>, Option<usize>)| {
                        let entry = vertices.entry((object_index, vtindex));
                        let index = entry.index();
                        entry.or_insert_with(|| {
                            let vertex = &o.vertices[vtindex.0];
                            let tex_vertex = vtindex.1.map(|i| &o.tex_vertices[i]);
                            let normal = vtindex.2.map(|i| &o.normals[i]);
                            VertexData {
                                pos: WorldPoint::new(vertex.x, vertex.y, vertex.z),
                                tex: tex_vertex
                                    .map_or_else(TexturePoint::origin, |v| TexturePoint::new(v.u, v.v)),
                                normal: normal.map_or_else(WorldVector::zeros, |v| {
                                    WorldVector::new(v.x, v.y, v.z).normalize()
                                }),
                            }
                        });
                        index
                    };

                    let a = handle_vertex(a);
                    let b = handle_vertex(b);
                    let c = handle_vertex(c);

                    triangles.push(Triangle::new(a, b, c));
                }
            }
        }

        if skipped > 0 {
            warn!("Skipped {skipped} non-triangle primitives");
        }

        (triangles, vertices.into_values().collect())
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertices(&self) -> &[VertexData] {
        &self.vertices
    }

    fn triangle(&self, index: usize) -> Triangle<WorldPoint> {
        self.triangles[index].map(|i| self.vertices[*i].pos)
    }

    fn smooth_shading(&self, index: usize) -> bool {
        self.triangles[index]
            .iter()
            .all(|i| self.vertices[*i].normal.norm_squared() > 0.0)
    }
}

impl Shape for Mesh {
    fn local_bounds(&self) -> WorldBox {
        self.bounds.clone()
    }

    fn tentry_texit(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        t0: FloatType,
        t1: FloatType,
        parallel_epsilon: FloatType,
    ) -> Option<SlabHit> {
        let crossings = (0..self.triangles.len()).filter_map(|index| {
            self.triangle(index)
                .intersect_line(p0, p1, parallel_epsilon)
                .map(|(alpha, _)| (alpha, index))
        });
        match crossings.minmax_by_key(|(alpha, _)| OrderedFloat(*alpha)) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement((alpha, index)) => {
                Some(SlabHit::from_alphas(alpha, alpha, index, index, t0, t1))
            }
            MinMaxResult::MinMax((entry, entry_index), (exit, exit_index)) => Some(
                SlabHit::from_alphas(entry, exit, entry_index, exit_index, t0, t1),
            ),
        }
    }

    fn line_crossings(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        parallel_epsilon: FloatType,
    ) -> Vec<(FloatType, usize)> {
        let mut ret: Vec<_> = (0..self.triangles.len())
            .filter_map(|index| {
                self.triangle(index)
                    .intersect_line(p0, p1, parallel_epsilon)
                    .map(|(alpha, _)| (alpha, index))
            })
            .collect();
        ret.sort_by_key(|(alpha, _)| OrderedFloat(*alpha));
        // Lines through a shared edge cross both triangles
        ret.dedup_by(|b, a| (b.0 - a.0).abs() < EPSILON);
        ret
    }

    /// Interpolated vertex normal if every vertex of the face has one, face normal otherwise.
    fn normal(&self, p: &WorldPoint, part: usize) -> WorldVector {
        let triangle = self.triangle(part);
        if !self.smooth_shading(part) {
            return triangle.normal();
        }
        let uv = triangle.barycentric(p);
        uv.interpolate_triangle(&self.triangles[part].map(|i| self.vertices[*i].normal))
    }

    fn tex_uv(&self, p: &WorldPoint, part: usize) -> TexturePoint {
        let uv = self.triangle(part).barycentric(p);
        TexturePoint::from(
            uv.interpolate_triangle(&self.triangles[part].map(|i| self.vertices[*i].tex.coords)),
        )
    }

    fn is_solid(&self) -> bool {
        false
    }
}

#[derive(Debug, Error)]
pub enum MeshLoadError {
    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    ParseError(#[from] wavefront_obj::ParseError),
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::{assert, let_assert};

    const TETRAHEDRON: &str = "\
o tetrahedron
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
v 0.0 0.0 1.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
f 1/1 3/3 2/2
f 1/1 2/2 4/3
f 1/1 4/3 3/2
f 2 3 4
";

    fn tetrahedron() -> Mesh {
        let_assert!(Ok(mesh) = Mesh::from_obj_source(TETRAHEDRON.to_string()));
        mesh
    }

    #[test]
    fn obj_vertices_are_deduplicated() {
        let mesh = tetrahedron();
        assert!(mesh.triangle_count() == 4);
        // Five distinct position/texture pairs, the last face adds untextured copies
        assert!(mesh.vertices().len() == 8);
        assert!(mesh.local_bounds() == WorldBox::new(WorldPoint::origin(), WorldPoint::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn first_and_last_crossing() {
        let mesh = tetrahedron();
        let_assert!(
            Some(hit) = mesh.tentry_texit(
                &WorldPoint::new(0.1, 0.1, -1.0),
                &WorldPoint::new(0.1, 0.1, 2.0),
                0.0,
                3.0,
                1e-12
            )
        );
        assert!((hit.t_entry - 1.0).abs() < 1e-12);
        assert!((hit.t_exit - 1.8).abs() < 1e-12);
        assert!(hit.face_entry == 0);
        assert!(hit.face_exit == 3);
        assert!(mesh.normal(&WorldPoint::new(0.1, 0.1, 0.0), 0).z < 0.0);
    }

    fn stacked_triangles() -> Mesh {
        let vertices = [0.0, 5.0, 10.0]
            .into_iter()
            .flat_map(|z| {
                [
                    VertexData::at(WorldPoint::new(0.0, 0.0, z)),
                    VertexData::at(WorldPoint::new(1.0, 0.0, z)),
                    VertexData::at(WorldPoint::new(0.0, 1.0, z)),
                ]
            })
            .collect();
        let triangles = (0..3).map(|i| Triangle::new(3 * i, 3 * i + 1, 3 * i + 2)).collect();
        Mesh::new(triangles, vertices)
    }

    #[test]
    fn every_crossing_of_the_line() {
        let mesh = stacked_triangles();
        let crossings = mesh.line_crossings(
            &WorldPoint::new(0.2, 0.2, 4.0),
            &WorldPoint::new(0.2, 0.2, 6.0),
            1e-12,
        );
        let parts: Vec<_> = crossings.iter().map(|(_, part)| *part).collect();
        assert!(parts == vec![0, 1, 2]);
        for ((alpha, _), expected) in crossings.iter().zip([-2.0, 0.5, 3.0]) {
            assert!((alpha - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn shared_edge_is_crossed_once() {
        let vertices = vec![
            VertexData::at(WorldPoint::new(0.0, 0.0, 0.0)),
            VertexData::at(WorldPoint::new(1.0, 0.0, 0.0)),
            VertexData::at(WorldPoint::new(0.0, 1.0, 0.0)),
            VertexData::at(WorldPoint::new(1.0, 1.0, 0.0)),
        ];
        let mesh = Mesh::new(vec![Triangle::new(0, 1, 2), Triangle::new(1, 3, 2)], vertices);
        let crossings = mesh.line_crossings(
            &WorldPoint::new(0.5, 0.5, 1.0),
            &WorldPoint::new(0.5, 0.5, -1.0),
            1e-12,
        );
        assert!(crossings.len() == 1);
        assert!((crossings[0].0 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn texture_from_vertices() {
        let mesh = tetrahedron();
        let uv = mesh.tex_uv(&WorldPoint::new(0.0, 0.5, 0.0), 0);
        assert!((uv - TexturePoint::new(0.0, 0.5)).norm() < 1e-12);
    }

    #[test]
    fn garbage_fails_to_parse() {
        let_assert!(Err(MeshLoadError::ParseError(_)) = Mesh::from_obj_source("v 1.0 x\n".to_string()));
    }

    #[test]
    fn missing_file_fails_to_read() {
        let_assert!(Err(MeshLoadError::ReadError(_)) = Mesh::with_obj("/nonexistent/model.obj"));
    }
}
