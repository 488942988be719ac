use nalgebra::Matrix4;

use crate::geometry::{FloatType, FourVector, SpacetimePoint, spatial_part};

use super::{CoordType, FrameType, Metric, natural_metric};

/// Flat spacetime in Cartesian coordinates, `c = 1`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Minkowski;

impl Metric for Minkowski {
    fn coefficients(&self, _pos: &SpacetimePoint) -> Matrix4<FloatType> {
        natural_metric(self.sign())
    }

    fn sign(&self) -> FloatType {
        -1.0
    }

    fn break_condition(&self, pos: &SpacetimePoint) -> bool {
        pos.iter().any(|x| !x.is_finite())
    }

    fn local_to_coord(&self, _pos: &SpacetimePoint, v: &FourVector, _frame: FrameType) -> FourVector {
        *v
    }

    fn coord_to_local(&self, _pos: &SpacetimePoint, v: &FourVector, _frame: FrameType) -> FourVector {
        *v
    }

    fn calc_sep_dist(&self, p: &SpacetimePoint, q: &SpacetimePoint) -> (FloatType, FloatType) {
        (
            (spatial_part(q) - spatial_part(p)).norm(),
            (q[0] - p[0]).abs(),
        )
    }

    fn trans_to_pseudo_cart(&self, pos: &SpacetimePoint) -> (usize, SpacetimePoint) {
        (0, *pos)
    }

    fn coord_type(&self) -> CoordType {
        CoordType::Cartesian
    }
}
