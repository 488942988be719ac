//! Discretized rays and the hits recorded on them.
//!
//! A ray is a polyline of spacetime points handed over by a geodesic solver. Distances along
//! the ray are `segment index + α` with `α ∈ [0, 1)` the fraction along that segment.

pub mod geodesic;
mod intersection;
mod span_list;

pub use geodesic::{GeodesicSolver, Polyline, StraightLine};
pub use intersection::Intersection;
pub use span_list::{Span, SpanList};

use bon::bon;
use ordered_float::OrderedFloat;

use crate::{
    error::CoreError,
    geometry::{FloatType, FourVector, SpacetimePoint},
    metric::Metric,
    tetrad::LocalTetrad,
    util::RayId,
};

/// Which hits a ray keeps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HitPolicy {
    /// Only the nearest hit; every accepted hit narrows the search interval.
    #[default]
    Closest,
    /// The first accepted hit, after which the search stops.
    Any,
    /// Every hit, regardless of the search interval.
    All,
}

#[derive(Debug)]
pub struct Ray<'s> {
    id: Option<RayId>,
    points: Vec<SpacetimePoint>,
    tangents: Option<Vec<FourVector>>,
    tetrads: Option<Vec<LocalTetrad>>,
    /// Pseudo-Cartesian image of every point, with its chart.
    pseudo_cart: Vec<(usize, SpacetimePoint)>,
    policy: HitPolicy,
    min_dist: FloatType,
    max_dist: FloatType,
    hits: Vec<Intersection<'s>>,
}

#[bon]
impl<'s> Ray<'s> {
    #[builder]
    pub fn new(
        points: Vec<SpacetimePoint>,
        metric: &dyn Metric,
        #[builder(default)] policy: HitPolicy,
        tangents: Option<Vec<FourVector>>,
        tetrads: Option<Vec<LocalTetrad>>,
        id: Option<RayId>,
    ) -> Result<Self, CoreError> {
        if points.len() < 2 {
            return Err(CoreError::TooFewPoints(points.len()));
        }
        if let Some(tangents) = &tangents {
            assert2::assert!(tangents.len() == points.len());
        }
        if let Some(tetrads) = &tetrads {
            assert2::assert!(tetrads.len() == points.len());
        }

        let pseudo_cart = points
            .iter()
            .map(|p| metric.trans_to_pseudo_cart(p))
            .collect();

        Ok(Ray {
            id,
            max_dist: (points.len() - 1) as FloatType,
            points,
            tangents,
            tetrads,
            pseudo_cart,
            policy,
            min_dist: 0.0,
            hits: Vec::new(),
        })
    }
}

impl<'s> Ray<'s> {
    /// Ray whose points already are Cartesian coordinates of a local frame.
    pub fn local(points: Vec<SpacetimePoint>, policy: HitPolicy) -> Result<Self, CoreError> {
        if points.len() < 2 {
            return Err(CoreError::TooFewPoints(points.len()));
        }
        Ok(Ray {
            id: None,
            max_dist: (points.len() - 1) as FloatType,
            pseudo_cart: points.iter().map(|p| (0, *p)).collect(),
            points,
            tangents: None,
            tetrads: None,
            policy,
            min_dist: 0.0,
            hits: Vec::new(),
        })
    }

    pub fn from_polyline(
        polyline: Polyline,
        metric: &dyn Metric,
        policy: HitPolicy,
    ) -> Result<Self, CoreError> {
        Ray::builder()
            .points(polyline.points)
            .metric(metric)
            .policy(policy)
            .maybe_tangents(polyline.tangents)
            .maybe_tetrads(polyline.tetrads)
            .build()
    }

    pub fn id(&self) -> Option<RayId> {
        self.id
    }

    pub fn policy(&self) -> HitPolicy {
        self.policy
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_segments(&self) -> usize {
        self.points.len() - 1
    }

    pub fn point(&self, i: usize) -> &SpacetimePoint {
        &self.points[i]
    }

    pub fn tangent(&self, i: usize) -> Option<&FourVector> {
        self.tangents.as_ref().map(|t| &t[i])
    }

    pub fn tetrad(&self, i: usize) -> Option<&LocalTetrad> {
        self.tetrads.as_ref().map(|t| &t[i])
    }

    pub fn pseudo_cart(&self, i: usize) -> &SpacetimePoint {
        &self.pseudo_cart[i].1
    }

    pub fn chart(&self, i: usize) -> usize {
        self.pseudo_cart[i].0
    }

    /// Difference of the segment's end points in chart coordinates.
    pub fn segment_direction(&self, segment: usize) -> FourVector {
        self.points[segment + 1] - self.points[segment]
    }

    /// Point at ray distance `dist`, linear within its segment.
    pub fn point_at(&self, dist: FloatType) -> SpacetimePoint {
        let (segment, alpha) = self.split_dist(dist);
        self.points[segment] + self.segment_direction(segment) * alpha
    }

    /// Segment index and fraction for a distance, clamped to the ray.
    pub fn split_dist(&self, dist: FloatType) -> (usize, FloatType) {
        let segment = (dist.max(0.0) as usize).min(self.num_segments() - 1);
        (segment, dist - segment as FloatType)
    }

    pub fn set_search_interval(&mut self, min_dist: FloatType, max_dist: FloatType) {
        self.min_dist = min_dist;
        self.max_dist = max_dist;
    }

    pub fn search_interval(&self) -> (FloatType, FloatType) {
        (self.min_dist, self.max_dist)
    }

    /// True if a hit at `dist` could still be recorded.
    pub fn accepts(&self, dist: FloatType) -> bool {
        match self.policy {
            HitPolicy::All => true,
            HitPolicy::Any if !self.hits.is_empty() => false,
            HitPolicy::Closest | HitPolicy::Any => {
                self.min_dist <= dist && dist <= self.max_dist
            }
        }
    }

    /// Hands a hit to the ray, returns whether it was kept.
    pub fn record(&mut self, intersection: Intersection<'s>) -> bool {
        if !self.accepts(intersection.dist()) {
            return false;
        }
        match self.policy {
            HitPolicy::Closest => {
                self.max_dist = intersection.dist();
                self.hits.clear();
                self.hits.push(intersection);
            }
            HitPolicy::Any => self.hits.push(intersection),
            HitPolicy::All => {
                let key = OrderedFloat(intersection.dist());
                let index = self
                    .hits
                    .partition_point(|hit| OrderedFloat(hit.dist()) <= key);
                self.hits.insert(index, intersection);
            }
        }
        true
    }

    /// True once no further hit can change the result.
    pub fn finished(&self) -> bool {
        self.policy == HitPolicy::Any && !self.hits.is_empty()
    }

    /// Recorded hits, ordered by distance.
    pub fn hits(&self) -> &[Intersection<'s>] {
        &self.hits
    }

    pub fn closest(&self) -> Option<&Intersection<'s>> {
        self.hits.first()
    }

    pub fn take_hits(&mut self) -> Vec<Intersection<'s>> {
        std::mem::take(&mut self.hits)
    }
}
