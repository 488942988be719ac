use std::{cell::OnceCell, cmp::Ordering};

use crate::{
    geometry::{DIST_EPSILON, FloatType, FourVector, SpacetimePoint, TexturePoint, WorldVector},
    scene::Surface,
    tetrad::LocalTetrad,
};

use super::Ray;

/// A place where a ray meets a surface.
///
/// Normal and texture coordinates are computed by the owning surface on first access.
#[derive(Clone, Debug)]
pub struct Intersection<'s> {
    dist: FloatType,
    point: SpacetimePoint,
    direction: FourVector,
    local_point: SpacetimePoint,
    local_direction: FourVector,
    part: usize,
    surface: Option<&'s dyn Surface>,
    tetrad: Option<LocalTetrad>,
    proper_time: Option<FloatType>,
    normal: OnceCell<WorldVector>,
    tex_uv: OnceCell<TexturePoint>,
    self_describing: bool,
    flipped: bool,
}

impl<'s> Intersection<'s> {
    /// Record carrying only a distance, e.g. the unbounded ends of an inverted span.
    pub fn at_distance(dist: FloatType) -> Self {
        Intersection {
            dist,
            point: SpacetimePoint::origin(),
            direction: FourVector::zeros(),
            local_point: SpacetimePoint::origin(),
            local_direction: FourVector::zeros(),
            part: 0,
            surface: None,
            tetrad: None,
            proper_time: None,
            normal: OnceCell::new(),
            tex_uv: OnceCell::new(),
            self_describing: true,
            flipped: false,
        }
    }

    /// Record at `dist` along `ray`, with the global point and direction filled in.
    pub fn on_ray(ray: &Ray<'_>, dist: FloatType) -> Self {
        let (segment, _) = ray.split_dist(dist);
        Intersection {
            point: ray.point_at(dist),
            direction: ray.segment_direction(segment),
            ..Self::at_distance(dist)
        }
    }

    pub fn with_local(mut self, point: SpacetimePoint, direction: FourVector) -> Self {
        self.local_point = point;
        self.local_direction = direction;
        self.reset_cache();
        self
    }

    pub fn with_surface(mut self, surface: &'s dyn Surface, part: usize) -> Self {
        self.surface = Some(surface);
        self.part = part;
        self.reset_cache();
        self
    }

    pub fn with_tetrad(mut self, tetrad: LocalTetrad, proper_time: FloatType) -> Self {
        self.tetrad = Some(tetrad);
        self.proper_time = Some(proper_time);
        self
    }

    /// Moves the record to another ray, keeping everything the surface needs.
    pub fn with_global(mut self, dist: FloatType, point: SpacetimePoint, direction: FourVector) -> Self {
        self.dist = dist;
        self.point = point;
        self.direction = direction;
        self
    }

    fn reset_cache(&mut self) {
        self.normal = OnceCell::new();
        self.tex_uv = OnceCell::new();
    }

    pub fn dist(&self) -> FloatType {
        self.dist
    }

    pub fn point(&self) -> &SpacetimePoint {
        &self.point
    }

    pub fn direction(&self) -> &FourVector {
        &self.direction
    }

    pub fn local_point(&self) -> &SpacetimePoint {
        &self.local_point
    }

    pub fn local_direction(&self) -> &FourVector {
        &self.local_direction
    }

    /// Face or part index, meaning depends on the surface.
    pub fn part(&self) -> usize {
        self.part
    }

    pub fn surface(&self) -> Option<&'s dyn Surface> {
        self.surface
    }

    pub fn tetrad(&self) -> Option<&LocalTetrad> {
        self.tetrad.as_ref()
    }

    pub fn proper_time(&self) -> Option<FloatType> {
        self.proper_time
    }

    /// False when a compound reports a hit whose face data belongs to one of its children.
    pub fn is_self_describing(&self) -> bool {
        self.self_describing
    }

    pub fn set_self_describing(&mut self, self_describing: bool) {
        self.self_describing = self_describing;
    }

    /// True when the record bounds an inverted span and its normal points the other way.
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Unit surface normal in pseudo-Cartesian space, zero for records without a surface.
    pub fn normal(&self) -> WorldVector {
        let normal = *self.normal.get_or_init(|| match self.surface {
            Some(surface) => surface.calc_normal(self),
            None => WorldVector::zeros(),
        });
        if self.flipped { -normal } else { normal }
    }

    pub fn tex_uv(&self) -> TexturePoint {
        *self.tex_uv.get_or_init(|| match self.surface {
            Some(surface) => surface.calc_tex_uv(self),
            None => TexturePoint::origin(),
        })
    }
}

/// Records are equal when their distances are within `DIST_EPSILON`.
impl PartialEq for Intersection<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist || (self.dist - other.dist).abs() < DIST_EPSILON
    }
}

impl PartialOrd for Intersection<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else {
            self.dist.partial_cmp(&other.dist)
        }
    }
}
