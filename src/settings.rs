use bon::bon;

use crate::geometry::{DIST_EPSILON, FloatType};

/// Numeric tolerances and acceleration parameters shared by the scene objects.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TraceSettings {
    /// Spans starting closer than this to the ray origin are not reported by CSG nodes.
    pub span_epsilon: FloatType,
    pub dist_epsilon: FloatType,
    /// Segment direction components below this are treated as parallel to an axis.
    pub parallel_epsilon: FloatType,
    pub octree_depth: u32,
    /// Time extent of the spacetime bound attached to worldline frames.
    pub time_box_size: FloatType,
}

#[bon]
impl TraceSettings {
    #[builder]
    pub fn new(
        #[builder(default = 1e-6)] span_epsilon: FloatType,
        #[builder(default = DIST_EPSILON)] dist_epsilon: FloatType,
        #[builder(default = 1e-12)] parallel_epsilon: FloatType,
        #[builder(default = 3)] octree_depth: u32,
        #[builder(default = 1.0)] time_box_size: FloatType,
    ) -> Self {
        assert2::assert!(span_epsilon >= 0.0);
        assert2::assert!(dist_epsilon >= 0.0);
        assert2::assert!(parallel_epsilon >= 0.0);
        assert2::assert!(time_box_size > 0.0);
        TraceSettings {
            span_epsilon,
            dist_epsilon,
            parallel_epsilon,
            octree_depth,
            time_box_size,
        }
    }
}

impl Default for TraceSettings {
    fn default() -> Self {
        TraceSettings::builder().build()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;

    #[test]
    fn builder_overrides_single_fields() {
        let s = TraceSettings::builder().octree_depth(5).build();
        assert!(s.octree_depth == 5);
        assert!(s.span_epsilon == TraceSettings::default().span_epsilon);
    }
}
