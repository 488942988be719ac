use std::ops::{Add, Mul};

use nalgebra::{DefaultAllocator, DimName, Matrix4, OPoint, OVector, allocator::Allocator};

use super::{FloatType, WorldPoint};

/// Axis aligned box. A box with `min > max` along any axis is empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundBox<Point> {
    pub min: Point,
    pub max: Point,
}

impl<Point> BoundBox<Point> {
    pub fn new(min: Point, max: Point) -> BoundBox<Point> {
        BoundBox { min, max }
    }

    pub fn map<Point2, F: FnMut(&Point) -> Point2>(&self, mut f: F) -> BoundBox<Point2> {
        BoundBox {
            min: f(&self.min),
            max: f(&self.max),
        }
    }

    pub fn zip_map<Point2, Point3, F: FnMut(&Point, &Point2) -> Point3>(
        &self,
        rhs: &BoundBox<Point2>,
        mut f: F,
    ) -> BoundBox<Point3> {
        BoundBox {
            min: f(&self.min, &rhs.min),
            max: f(&self.max, &rhs.max),
        }
    }
}

impl<D: DimName> BoundBox<OPoint<FloatType, D>>
where
    DefaultAllocator: Allocator<D>,
{
    /// Box that contains nothing and is neutral for union.
    pub fn empty() -> Self {
        BoundBox {
            min: OPoint::from(OVector::<FloatType, D>::repeat(FloatType::INFINITY)),
            max: OPoint::from(OVector::<FloatType, D>::repeat(FloatType::NEG_INFINITY)),
        }
    }

    /// Box that contains everything.
    pub fn infinite() -> Self {
        BoundBox {
            min: OPoint::from(OVector::<FloatType, D>::repeat(FloatType::NEG_INFINITY)),
            max: OPoint::from(OVector::<FloatType, D>::repeat(FloatType::INFINITY)),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a OPoint<FloatType, D>>) -> Self
    where
        OPoint<FloatType, D>: 'a,
    {
        let mut ret = Self::empty();
        for p in points {
            ret.extend_to_contain(p);
        }
        ret
    }

    pub fn is_empty(&self) -> bool {
        self.min
            .coords
            .iter()
            .zip(self.max.coords.iter())
            .any(|(lo, hi)| lo > hi)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: &OPoint<FloatType, D>) -> bool {
        self.min
            .coords
            .iter()
            .zip(self.max.coords.iter())
            .zip(p.coords.iter())
            .all(|((lo, hi), x)| lo <= x && x <= hi)
    }

    pub fn extend_to_contain(&mut self, p: &OPoint<FloatType, D>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn size(&self) -> OVector<FloatType, D> {
        &self.max - &self.min
    }

    pub fn center(&self) -> OPoint<FloatType, D> {
        OPoint::from((&self.min.coords + &self.max.coords) * 0.5)
    }

    /// Grows the box by `margin` along every axis.
    pub fn expanded(&self, margin: FloatType) -> Self {
        let mut ret = self.clone();
        ret.min.coords.apply(|x| *x -= margin);
        ret.max.coords.apply(|x| *x += margin);
        ret
    }
}

/// Union: smallest box containing both operands.
impl<D: DimName> Add for BoundBox<OPoint<FloatType, D>>
where
    DefaultAllocator: Allocator<D>,
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_empty() {
            return rhs;
        }
        if rhs.is_empty() {
            return self;
        }
        BoundBox {
            min: self.min.inf(&rhs.min),
            max: self.max.sup(&rhs.max),
        }
    }
}

/// Intersection: largest box contained in both operands.
impl<D: DimName> Mul for BoundBox<OPoint<FloatType, D>>
where
    DefaultAllocator: Allocator<D>,
{
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        BoundBox {
            min: self.min.sup(&rhs.min),
            max: self.max.inf(&rhs.max),
        }
    }
}

impl BoundBox<WorldPoint> {
    pub fn corners(&self) -> [WorldPoint; 8] {
        std::array::from_fn(|i| {
            WorldPoint::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Box enclosing this box after an affine transformation given as homogeneous matrix.
    pub fn transform(&self, matrix: &Matrix4<FloatType>) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        if self.min.iter().chain(self.max.iter()).any(|x| x.is_infinite()) {
            return Self::transform_unbounded(self, matrix);
        }
        let corners = self.corners().map(|c| matrix.transform_point(&c));
        Self::from_points(corners.iter())
    }

    /// Infinite boxes stay infinite along every output axis that any infinite input axis feeds.
    fn transform_unbounded(&self, matrix: &Matrix4<FloatType>) -> Self {
        let finite = self.map(|p| p.map(|x| if x.is_finite() { x } else { 0.0 }));
        let mut ret = finite.transform(matrix);
        for row in 0..3 {
            let spills = (0..3).any(|col| {
                matrix[(row, col)] != 0.0
                    && (self.min[col].is_infinite() || self.max[col].is_infinite())
            });
            if spills {
                ret.min[row] = FloatType::NEG_INFINITY;
                ret.max[row] = FloatType::INFINITY;
            }
        }
        ret
    }
}
