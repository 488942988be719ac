//! Interval algebra over ray distances for constructive solid geometry.
//!
//! A span is a stretch of the ray inside a solid, bounded by the two intersection records
//! where the ray enters and leaves it. Boolean operators on whole lists implement union,
//! intersection and difference of solids along one ray.

use std::ops::{Add, Mul, Neg, Sub};

use itertools::Itertools as _;

use crate::geometry::FloatType;

use super::Intersection;

#[derive(Clone, Debug)]
pub struct Span<'s> {
    pub lo: Intersection<'s>,
    pub hi: Intersection<'s>,
}

impl<'s> Span<'s> {
    /// Span between two records in either order.
    pub fn new(a: Intersection<'s>, b: Intersection<'s>) -> Self {
        if a.dist() <= b.dist() {
            Span { lo: a, hi: b }
        } else {
            Span { lo: b, hi: a }
        }
    }

    pub fn contains(&self, dist: FloatType) -> bool {
        self.lo.dist() <= dist && dist <= self.hi.dist()
    }

    pub fn length(&self) -> FloatType {
        self.hi.dist() - self.lo.dist()
    }
}

/// Spans sorted by their lower bound.
///
/// Lists built with [`SpanList::insert`] may overlap, every boolean operator returns a
/// list of pairwise disjoint spans.
#[derive(Clone, Debug, Default)]
pub struct SpanList<'s> {
    spans: Vec<Span<'s>>,
}

impl<'s> SpanList<'s> {
    pub fn new() -> Self {
        SpanList { spans: Vec::new() }
    }

    /// The whole ray, from minus to plus infinity.
    pub fn everything() -> Self {
        SpanList {
            spans: vec![Span {
                lo: Intersection::at_distance(FloatType::NEG_INFINITY),
                hi: Intersection::at_distance(FloatType::INFINITY),
            }],
        }
    }

    /// Inserts the span between `a` and `b`, keeping the list sorted by lower bound.
    pub fn insert(&mut self, a: Intersection<'s>, b: Intersection<'s>) {
        let span = Span::new(a, b);
        let index = self
            .spans
            .iter()
            .position(|s| s.lo.dist() > span.lo.dist())
            .unwrap_or(self.spans.len());
        self.spans.insert(index, span);
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span<'s>> {
        self.spans.iter()
    }

    pub fn covers(&self, dist: FloatType) -> bool {
        self.spans.iter().any(|s| s.contains(dist))
    }

    /// First span that starts strictly beyond `epsilon`.
    pub fn first_beyond(&self, epsilon: FloatType) -> Option<&Span<'s>> {
        self.spans.iter().find(|s| s.lo.dist() > epsilon)
    }

    /// Same coverage with overlapping and touching spans merged.
    fn normalized(self) -> Self {
        self + SpanList::new()
    }
}

impl<'s> IntoIterator for SpanList<'s> {
    type Item = Span<'s>;
    type IntoIter = std::vec::IntoIter<Span<'s>>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.into_iter()
    }
}

/// Union.
impl<'s> Add for SpanList<'s> {
    type Output = SpanList<'s>;

    fn add(self, rhs: SpanList<'s>) -> SpanList<'s> {
        let mut spans: Vec<Span<'s>> = Vec::with_capacity(self.len() + rhs.len());
        for span in self
            .spans
            .into_iter()
            .merge_by(rhs.spans, |a, b| a.lo.dist() <= b.lo.dist())
        {
            match spans.last_mut() {
                Some(current) if span.lo.dist() <= current.hi.dist() => {
                    if span.hi.dist() > current.hi.dist() {
                        current.hi = span.hi;
                    }
                }
                _ => spans.push(span),
            }
        }
        SpanList { spans }
    }
}

/// Intersection.
impl<'s> Mul for SpanList<'s> {
    type Output = SpanList<'s>;

    fn mul(self, rhs: SpanList<'s>) -> SpanList<'s> {
        let a = self.normalized().spans;
        let b = rhs.normalized().spans;
        let mut spans = Vec::new();

        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            let lo = if a[i].lo.dist() >= b[j].lo.dist() {
                &a[i].lo
            } else {
                &b[j].lo
            };
            let a_ends_first = a[i].hi.dist() <= b[j].hi.dist();
            let hi = if a_ends_first { &a[i].hi } else { &b[j].hi };

            if lo.dist() < hi.dist() {
                spans.push(Span {
                    lo: lo.clone(),
                    hi: hi.clone(),
                });
            }

            if a_ends_first {
                i += 1;
            } else {
                j += 1;
            }
        }

        SpanList { spans }
    }
}

/// Complement against the whole ray. The boundary records swap roles, so they are flipped.
impl<'s> Neg for SpanList<'s> {
    type Output = SpanList<'s>;

    fn neg(self) -> SpanList<'s> {
        if self.is_empty() {
            return SpanList::everything();
        }

        let mut spans = Vec::new();
        let mut previous = Intersection::at_distance(FloatType::NEG_INFINITY);
        for span in self.normalized().spans {
            if span.length() <= 0.0 {
                continue;
            }
            let Span { mut lo, mut hi } = span;
            if previous.dist() < lo.dist() {
                lo.flip();
                spans.push(Span { lo: previous, hi: lo });
            }
            hi.flip();
            previous = hi;
        }
        if previous.dist() < FloatType::INFINITY {
            spans.push(Span {
                lo: previous,
                hi: Intersection::at_distance(FloatType::INFINITY),
            });
        }

        SpanList { spans }
    }
}

/// Difference, `a - b = a * (-b)`.
impl<'s> Sub for SpanList<'s> {
    type Output = SpanList<'s>;

    fn sub(self, rhs: SpanList<'s>) -> SpanList<'s> {
        self * (-rhs)
    }
}
