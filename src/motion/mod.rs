//! Objects moving relative to the chart the rays are given in.

mod const_velocity;
mod worldline;

pub use const_velocity::{ConstVelocity, boost_matrix};
pub use worldline::Worldline;

use crate::{
    error::CoreError,
    geometry::{FloatType, SpacetimePoint},
    ray::Ray,
    tetrad::LocalTetrad,
};

/// A ray segment expressed in the rest frame of a moving object.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalSegment {
    pub p0: SpacetimePoint,
    pub p1: SpacetimePoint,
    /// Worldline frames used for the two ends.
    pub(crate) frames: Option<(usize, usize)>,
    /// Coordinate times of the two ends.
    pub(crate) times: (FloatType, FloatType),
}

#[derive(Debug)]
pub enum Motion {
    ConstVelocity(ConstVelocity),
    Worldline(Worldline),
}

impl Motion {
    /// Maps segment `segment` of `ray` into the object's rest frame, `None` if the segment
    /// cannot reach the object.
    ///
    /// Uniform motion works on the pseudo-Cartesian points of the ray, worldlines on the
    /// chart coordinates their frames are given in.
    pub fn local_segment(&self, ray: &Ray<'_>, segment: usize) -> Option<LocalSegment> {
        match self {
            Motion::ConstVelocity(motion) => {
                let (p0, p1) =
                    motion.transformed_segment(ray.pseudo_cart(segment), ray.pseudo_cart(segment + 1));
                Some(LocalSegment {
                    p0,
                    p1,
                    frames: None,
                    times: (ray.pseudo_cart(segment)[0], ray.pseudo_cart(segment + 1)[0]),
                })
            }
            Motion::Worldline(worldline) => {
                worldline.local_segment(ray.point(segment), ray.point(segment + 1))
            }
        }
    }

    /// Rest frame of the object at fraction `alpha` of a local segment, if the motion
    /// tracks one.
    pub fn tetrad_at(
        &self,
        segment: &LocalSegment,
        alpha: FloatType,
    ) -> Result<Option<LocalTetrad>, CoreError> {
        match self {
            Motion::ConstVelocity(_) => Ok(None),
            Motion::Worldline(worldline) => worldline.tetrad_at(segment, alpha),
        }
    }
}
