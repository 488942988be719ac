use std::f64::consts::{PI, TAU};

use nalgebra::Matrix4;

use crate::geometry::{FloatType, FourVector, SpacetimePoint, spatial_part};

use super::{CoordType, FrameType, Metric};

/// Schwarzschild spacetime in spherical coordinates `(t, r, θ, φ)`, `c = G = 1`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Schwarzschild {
    rs: FloatType,
}

impl Schwarzschild {
    pub fn new(rs: FloatType) -> Self {
        assert2::assert!(rs > 0.0);
        Schwarzschild { rs }
    }

    pub fn schwarzschild_radius(&self) -> FloatType {
        self.rs
    }

    /// Columns are the frame vectors in coordinate components.
    fn frame_matrix(&self, pos: &SpacetimePoint, frame: FrameType) -> Matrix4<FloatType> {
        let (r, theta) = (pos[1], pos[2]);
        let x = self.rs / r;
        let w = 1.0 - x;
        let mut m = Matrix4::zeros();
        match frame {
            FrameType::Static => {
                m[(0, 0)] = 1.0 / w.sqrt();
                m[(1, 1)] = w.sqrt();
            }
            FrameType::Falling => {
                m[(0, 0)] = 1.0 / w;
                m[(1, 0)] = -x.sqrt();
                m[(0, 1)] = -x.sqrt() / w;
                m[(1, 1)] = 1.0;
            }
        }
        m[(2, 2)] = 1.0 / r;
        m[(3, 3)] = 1.0 / (r * theta.sin());
        m
    }

    fn inverse_frame_matrix(&self, pos: &SpacetimePoint, frame: FrameType) -> Matrix4<FloatType> {
        let (r, theta) = (pos[1], pos[2]);
        let x = self.rs / r;
        let w = 1.0 - x;
        let mut m = Matrix4::zeros();
        match frame {
            FrameType::Static => {
                m[(0, 0)] = w.sqrt();
                m[(1, 1)] = 1.0 / w.sqrt();
            }
            // The (t, r) block of the falling frame has determinant 1
            FrameType::Falling => {
                m[(0, 0)] = 1.0;
                m[(0, 1)] = x.sqrt() / w;
                m[(1, 0)] = x.sqrt();
                m[(1, 1)] = 1.0 / w;
            }
        }
        m[(2, 2)] = r;
        m[(3, 3)] = r * theta.sin();
        m
    }
}

impl Metric for Schwarzschild {
    fn coefficients(&self, pos: &SpacetimePoint) -> Matrix4<FloatType> {
        let (r, theta) = (pos[1], pos[2]);
        let w = 1.0 - self.rs / r;
        Matrix4::from_diagonal(&FourVector::new(
            -w,
            1.0 / w,
            r * r,
            (r * theta.sin()).powi(2),
        ))
    }

    fn sign(&self) -> FloatType {
        -1.0
    }

    fn break_condition(&self, pos: &SpacetimePoint) -> bool {
        pos.iter().any(|x| !x.is_finite()) || pos[1] <= self.rs
    }

    fn local_to_coord(&self, pos: &SpacetimePoint, v: &FourVector, frame: FrameType) -> FourVector {
        self.frame_matrix(pos, frame) * v
    }

    fn coord_to_local(&self, pos: &SpacetimePoint, v: &FourVector, frame: FrameType) -> FourVector {
        self.inverse_frame_matrix(pos, frame) * v
    }

    fn calc_sep_dist(&self, p: &SpacetimePoint, q: &SpacetimePoint) -> (FloatType, FloatType) {
        let (_, pc) = self.trans_to_pseudo_cart(p);
        let (_, qc) = self.trans_to_pseudo_cart(q);
        (
            (spatial_part(&qc) - spatial_part(&pc)).norm(),
            (q[0] - p[0]).abs(),
        )
    }

    fn trans_to_pseudo_cart(&self, pos: &SpacetimePoint) -> (usize, SpacetimePoint) {
        let (r, theta, phi) = (pos[1], pos[2], pos[3]);
        (
            0,
            SpacetimePoint::new(
                pos[0],
                r * theta.sin() * phi.cos(),
                r * theta.sin() * phi.sin(),
                r * theta.cos(),
            ),
        )
    }

    fn coord_diff(&self, axis: usize, a: FloatType, b: FloatType) -> FloatType {
        let d = a - b;
        if axis != 3 {
            return d;
        }
        let wrapped = d.rem_euclid(TAU);
        if wrapped > PI { wrapped - TAU } else { wrapped }
    }

    fn coord_type(&self) -> CoordType {
        CoordType::Spherical
    }
}
