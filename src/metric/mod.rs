//! Interface to the spacetime metric.
//!
//! The intersection engine never evaluates curvature itself. Everything it needs from the
//! geometry of spacetime goes through [`Metric`]: scalar products, natural local frames,
//! periodic coordinate differences and the map to pseudo-Cartesian charts used for the
//! object space of primitives.

mod minkowski;
mod schwarzschild;

pub use minkowski::Minkowski;
pub use schwarzschild::Schwarzschild;

use std::fmt::Debug;

use nalgebra::Matrix4;

use crate::geometry::{FloatType, FourVector, SpacetimePoint};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CoordType {
    Cartesian,
    Spherical,
}

/// Named natural local frame of a metric.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// Observer at rest with respect to the coordinates.
    Static,
    /// Observer freely falling in from rest at infinity.
    Falling,
}

pub trait Metric: Send + Sync + Debug {
    /// Metric coefficients `g_ab` at `pos`.
    fn coefficients(&self, pos: &SpacetimePoint) -> Matrix4<FloatType>;

    /// Value of `g(u, u)` for a unit timelike vector `u`.
    fn sign(&self) -> FloatType;

    /// True where the coordinates (or the metric itself) break down.
    fn break_condition(&self, pos: &SpacetimePoint) -> bool;

    /// Natural frame components to coordinate components.
    fn local_to_coord(&self, pos: &SpacetimePoint, v: &FourVector, frame: FrameType) -> FourVector;

    /// Coordinate components to natural frame components.
    fn coord_to_local(&self, pos: &SpacetimePoint, v: &FourVector, frame: FrameType) -> FourVector;

    /// Spatial and temporal separation of two points, both non-negative.
    fn calc_sep_dist(&self, p: &SpacetimePoint, q: &SpacetimePoint) -> (FloatType, FloatType);

    /// Chart index and pseudo-Cartesian image of a point.
    fn trans_to_pseudo_cart(&self, pos: &SpacetimePoint) -> (usize, SpacetimePoint);

    /// `a - b` along coordinate `axis`, taking periodicity into account.
    fn coord_diff(&self, axis: usize, a: FloatType, b: FloatType) -> FloatType {
        let _ = axis;
        a - b
    }

    fn coord_type(&self) -> CoordType;

    fn scalar_product(&self, pos: &SpacetimePoint, a: &FourVector, b: &FourVector) -> FloatType {
        a.dot(&(self.coefficients(pos) * b))
    }

    /// Componentwise `coord_diff` of two points.
    fn point_diff(&self, a: &SpacetimePoint, b: &SpacetimePoint) -> FourVector {
        FourVector::from_fn(|i, _| self.coord_diff(i, a[i], b[i]))
    }
}

/// Local metric `diag(sign, -sign, -sign, -sign)` of an orthonormal frame.
pub fn natural_metric(sign: FloatType) -> Matrix4<FloatType> {
    Matrix4::from_diagonal(&FourVector::new(sign, -sign, -sign, -sign))
}
