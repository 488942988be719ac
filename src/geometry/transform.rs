use nalgebra::{Matrix4, Rotation3, Unit};

use super::{FloatType, WorldPoint, WorldVector};

/// Local to world affine map together with its inverse.
///
/// Every mutating operation updates both matrices, so the pair never drifts apart.
#[derive(Clone, Debug, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix4<FloatType>,
    inverse: Matrix4<FloatType>,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub fn identity() -> Self {
        AffineTransform {
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
        }
    }

    /// Returns `None` for singular matrices.
    pub fn from_matrix(matrix: Matrix4<FloatType>) -> Option<Self> {
        let inverse = matrix.try_inverse()?;
        Some(AffineTransform { matrix, inverse })
    }

    pub fn matrix(&self) -> &Matrix4<FloatType> {
        &self.matrix
    }

    pub fn inverse_matrix(&self) -> &Matrix4<FloatType> {
        &self.inverse
    }

    pub fn inverse(&self) -> AffineTransform {
        AffineTransform {
            matrix: self.inverse,
            inverse: self.matrix,
        }
    }

    /// Scales along the world axes after the current transform.
    /// Zero scale factors are rejected since they would make the transform singular.
    pub fn scale(&mut self, factors: &WorldVector) -> &mut Self {
        assert2::assert!(factors.iter().all(|f| *f != 0.0));
        self.matrix = Matrix4::new_nonuniform_scaling(factors) * self.matrix;
        self.inverse *= Matrix4::new_nonuniform_scaling(&factors.map(|f| 1.0 / f));
        self
    }

    pub fn translate(&mut self, offset: &WorldVector) -> &mut Self {
        self.matrix = Matrix4::new_translation(offset) * self.matrix;
        self.inverse *= Matrix4::new_translation(&-offset);
        self
    }

    pub fn rotate(&mut self, axis: &Unit<WorldVector>, angle: FloatType) -> &mut Self {
        let rotation = Rotation3::from_axis_angle(axis, angle);
        self.matrix = rotation.to_homogeneous() * self.matrix;
        self.inverse *= rotation.inverse().to_homogeneous();
        self
    }

    /// Applies `other` after this transform.
    pub fn compose(&mut self, other: &AffineTransform) -> &mut Self {
        self.matrix = other.matrix * self.matrix;
        self.inverse *= other.inverse;
        self
    }

    pub fn transform_point(&self, p: &WorldPoint) -> WorldPoint {
        self.matrix.transform_point(p)
    }

    pub fn inverse_transform_point(&self, p: &WorldPoint) -> WorldPoint {
        self.inverse.transform_point(p)
    }

    pub fn transform_vector(&self, v: &WorldVector) -> WorldVector {
        self.matrix.transform_vector(v)
    }

    pub fn inverse_transform_vector(&self, v: &WorldVector) -> WorldVector {
        self.inverse.transform_vector(v)
    }

    /// Maps a local surface normal to world space (inverse transpose of the linear part).
    pub fn transform_normal(&self, n: &WorldVector) -> WorldVector {
        self.inverse
            .fixed_view::<3, 3>(0, 0)
            .transpose()
            * n
    }
}
