use log::debug;

use crate::{
    error::CoreError,
    geometry::{FloatType, WorldBox},
    ray::{HitPolicy, Intersection, Ray, SpanList},
    settings::TraceSettings,
};

use super::SceneObject;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CsgOperation {
    Union,
    Intersection,
    /// Left minus right.
    Difference,
}

/// Boolean combination of two solids.
///
/// Hits are the boundaries of the combined spans. They keep pointing at the child surface
/// they came from and are marked as not self describing; boundaries taken over from the
/// inverted right operand of a difference are flipped.
#[derive(Debug)]
pub struct Csg {
    operation: CsgOperation,
    left: Box<dyn SceneObject>,
    right: Box<dyn SceneObject>,
    settings: TraceSettings,
}

impl Csg {
    /// Both children must be solid and live in the same chart.
    pub fn new(
        operation: CsgOperation,
        left: impl SceneObject + 'static,
        right: impl SceneObject + 'static,
        settings: &TraceSettings,
    ) -> Result<Self, CoreError> {
        if !left.is_solid() {
            return Err(CoreError::MissingCollaborator("solid left operand"));
        }
        if !right.is_solid() {
            return Err(CoreError::MissingCollaborator("solid right operand"));
        }
        if left.chart() != right.chart() {
            return Err(CoreError::ChartMismatch {
                expected: left.chart(),
                found: right.chart(),
            });
        }
        debug!(
            "{operation:?} of {:?} and {:?}",
            left.bound_box(),
            right.bound_box()
        );
        Ok(Csg {
            operation,
            left: Box::new(left),
            right: Box::new(right),
            settings: *settings,
        })
    }

    pub fn operation(&self) -> CsgOperation {
        self.operation
    }

    fn child_spans<'s>(
        child: &'s dyn SceneObject,
        ray: &Ray<'s>,
    ) -> Result<SpanList<'s>, CoreError> {
        child
            .spans(ray)?
            .ok_or(CoreError::MissingCollaborator("spans of a solid operand"))
    }

    fn report<'s>(&self, ray: &mut Ray<'s>, mut boundary: Intersection<'s>) -> bool {
        let dist = boundary.dist();
        if !dist.is_finite() || dist <= self.settings.span_epsilon || !ray.accepts(dist) {
            return false;
        }
        boundary.set_self_describing(false);
        ray.record(boundary)
    }
}

impl SceneObject for Csg {
    fn bound_box(&self) -> WorldBox {
        match self.operation {
            CsgOperation::Union => self.left.bound_box() + self.right.bound_box(),
            CsgOperation::Intersection => self.left.bound_box() * self.right.bound_box(),
            CsgOperation::Difference => self.left.bound_box(),
        }
    }

    fn chart(&self) -> usize {
        self.left.chart()
    }

    fn test_intersection<'s>(&'s self, ray: &mut Ray<'s>) -> Result<bool, CoreError> {
        let Some(spans) = self.spans(ray)? else {
            return Ok(false);
        };

        if ray.policy() != HitPolicy::All {
            let Some(span) = spans.into_iter().find(|s| s.lo.dist() > self.settings.span_epsilon)
            else {
                return Ok(false);
            };
            return Ok(self.report(ray, span.lo));
        }

        let mut found = false;
        let mut previous = FloatType::NEG_INFINITY;
        for span in spans {
            for boundary in [span.lo, span.hi] {
                let dist = boundary.dist();
                if dist - previous <= self.settings.dist_epsilon {
                    continue;
                }
                if self.report(ray, boundary) {
                    found = true;
                    previous = dist;
                }
            }
        }
        Ok(found)
    }

    fn is_solid(&self) -> bool {
        true
    }

    fn spans<'s>(&'s self, ray: &Ray<'s>) -> Result<Option<SpanList<'s>>, CoreError> {
        let left = Self::child_spans(self.left.as_ref(), ray)?;
        let right = Self::child_spans(self.right.as_ref(), ray)?;
        Ok(Some(match self.operation {
            CsgOperation::Union => left + right,
            CsgOperation::Intersection => left * right,
            CsgOperation::Difference => left - right,
        }))
    }
}
