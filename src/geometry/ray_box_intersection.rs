use super::{FloatType, WorldBox, WorldPoint};

/// Face of an axis aligned box, indexed as `2 * axis + side`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum BoxFace {
    Left = 0,
    Right = 1,
    Bottom = 2,
    Top = 3,
    Back = 4,
    Front = 5,
}

impl BoxFace {
    const ALL: [BoxFace; 6] = [
        BoxFace::Left,
        BoxFace::Right,
        BoxFace::Bottom,
        BoxFace::Top,
        BoxFace::Back,
        BoxFace::Front,
    ];

    pub fn new(axis: usize, max_side: bool) -> BoxFace {
        Self::ALL[2 * axis + max_side as usize]
    }

    pub fn from_index(index: usize) -> Option<BoxFace> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn axis(self) -> usize {
        self.index() / 2
    }

    pub fn is_max_side(self) -> bool {
        self.index() % 2 == 1
    }
}

/// Entry and exit of a segment through a convex shape.
///
/// Parameters are expressed in the segment's own time parametrization `t0 + α (t1 - t0)`,
/// entry is always the crossing met first when walking from the first endpoint.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlabHit {
    pub t_entry: FloatType,
    pub t_exit: FloatType,
    pub face_entry: usize,
    pub face_exit: usize,
}

impl SlabHit {
    /// Builds a hit from fractions along the segment, `alpha_entry <= alpha_exit`.
    pub fn from_alphas(
        alpha_entry: FloatType,
        alpha_exit: FloatType,
        face_entry: usize,
        face_exit: usize,
        t0: FloatType,
        t1: FloatType,
    ) -> SlabHit {
        let dt = t1 - t0;
        SlabHit {
            t_entry: t0 + alpha_entry * dt,
            t_exit: t0 + alpha_exit * dt,
            face_entry,
            face_exit,
        }
    }

    /// Converts a parameter back to the fraction along the segment.
    pub fn alpha(t: FloatType, t0: FloatType, t1: FloatType) -> FloatType {
        (t - t0) / (t1 - t0)
    }
}

impl WorldBox {
    /// Slab test of the line through `p0` and `p1`.
    ///
    /// Axes where the segment moves less than `parallel_epsilon` are checked by containment only.
    /// Returns `None` if the line misses the box or the segment has no extent at all.
    pub fn tentry_texit(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        t0: FloatType,
        t1: FloatType,
        parallel_epsilon: FloatType,
    ) -> Option<SlabHit> {
        let direction = p1 - p0;

        let mut alpha_min = FloatType::NEG_INFINITY;
        let mut alpha_max = FloatType::INFINITY;
        let mut face_min = BoxFace::Left;
        let mut face_max = BoxFace::Right;

        for axis in 0..3 {
            let d = direction[axis];
            if d.abs() < parallel_epsilon {
                if p0[axis] < self.min[axis] || p0[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }

            let mut to_min = ((self.min[axis] - p0[axis]) / d, BoxFace::new(axis, false));
            let mut to_max = ((self.max[axis] - p0[axis]) / d, BoxFace::new(axis, true));
            if to_min.0 > to_max.0 {
                std::mem::swap(&mut to_min, &mut to_max);
            }

            if to_min.0 > alpha_min {
                (alpha_min, face_min) = to_min;
            }
            if to_max.0 < alpha_max {
                (alpha_max, face_max) = to_max;
            }
            if alpha_min > alpha_max {
                return None;
            }
        }

        if !alpha_min.is_finite() || !alpha_max.is_finite() {
            return None;
        }

        Some(SlabHit::from_alphas(
            alpha_min,
            alpha_max,
            face_min.index(),
            face_max.index(),
            t0,
            t1,
        ))
    }
}
