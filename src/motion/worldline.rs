use std::sync::Once;

use log::{trace, warn};
use ordered_float::OrderedFloat;

use crate::{
    error::CoreError,
    geometry::{FloatType, SpacetimePoint},
    settings::TraceSettings,
    tetrad::LocalTetrad,
};

use super::LocalSegment;

/// Motion given by a time ordered sequence of local frames.
#[derive(Debug)]
pub struct Worldline {
    frames: Vec<LocalTetrad>,
    few_frames_warning: Once,
}

impl Worldline {
    /// Frames without a spacetime bound get one sized for an object of spatial
    /// half size `half_size`.
    pub fn new(
        mut frames: Vec<LocalTetrad>,
        half_size: FloatType,
        settings: &TraceSettings,
    ) -> Result<Self, CoreError> {
        if frames.is_empty() {
            return Err(CoreError::MissingCollaborator("worldline without frames"));
        }
        frames.sort_by_key(|frame| OrderedFloat(frame.time()));
        for frame in frames.iter_mut() {
            if frame.spacetime_bound().is_none() {
                frame.set_spacetime_bound(half_size, settings.time_box_size);
            }
        }
        Ok(Worldline {
            frames,
            few_frames_warning: Once::new(),
        })
    }

    pub fn frames(&self) -> &[LocalTetrad] {
        &self.frames
    }

    /// Index of the frame whose time is closest to `time`.
    pub fn closest_frame(&self, time: FloatType) -> usize {
        let above = self.frames.partition_point(|frame| frame.time() < time);
        if above == 0 {
            return 0;
        }
        if above == self.frames.len() {
            return above - 1;
        }
        let below = above - 1;
        if time - self.frames[below].time() <= self.frames[above].time() - time {
            below
        } else {
            above
        }
    }

    /// Frame indices used for the two ends of a segment.
    ///
    /// Both ends must land on different frames to have something to interpolate between.
    /// If they pick the same one, the first end moves to the previous frame, or the
    /// second end to the next frame when there is no previous one.
    pub fn segment_frames(&self, t0: FloatType, t1: FloatType) -> (usize, usize) {
        let i0 = self.closest_frame(t0);
        let i1 = self.closest_frame(t1);
        if i0 != i1 {
            return (i0, i1);
        }
        if self.frames.len() < 2 {
            self.few_frames_warning.call_once(|| {
                warn!(
                    "Worldline has {} frame(s), moving object cannot be interpolated",
                    self.frames.len()
                )
            });
            return (i0, i1);
        }
        if i0 > 0 { (i0 - 1, i1) } else { (i0, i1 + 1) }
    }

    /// Maps a segment given in chart coordinates into the frames of the worldline,
    /// or `None` if the segment is too far from the object to hit it.
    pub fn local_segment(
        &self,
        p0: &SpacetimePoint,
        p1: &SpacetimePoint,
    ) -> Option<LocalSegment> {
        let (i0, i1) = self.segment_frames(p0[0], p1[0]);
        let (f0, f1) = (&self.frames[i0], &self.frames[i1]);

        if let Some(bound) = match (f0.spacetime_bound(), f1.spacetime_bound()) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b).copied(),
        } {
            let metric = f0.metric();
            let (length, duration) = metric.calc_sep_dist(p0, p1);
            let (d0, dt0) = metric.calc_sep_dist(f0.position(), p0);
            let (d1, dt1) = metric.calc_sep_dist(f1.position(), p1);
            if d0.min(d1) - length > bound.max_distance || dt0.min(dt1) - duration > bound.max_time
            {
                trace!("Segment {p0:?} - {p1:?} culled by spacetime bound");
                return None;
            }
        }

        let to_local = |frame: &LocalTetrad, p: &SpacetimePoint| {
            let mut local = frame.trans_to_loc_tetrad(p);
            local[0] += frame.proper_time();
            local
        };

        Some(LocalSegment {
            p0: to_local(f0, p0),
            p1: to_local(f1, p1),
            frames: Some((i0, i1)),
            times: (p0[0], p1[0]),
        })
    }

    /// Frame at fraction `alpha` along a segment produced by [`Self::local_segment`].
    pub fn tetrad_at(
        &self,
        segment: &LocalSegment,
        alpha: FloatType,
    ) -> Result<Option<LocalTetrad>, CoreError> {
        let Some((i0, i1)) = segment.frames else {
            return Ok(None);
        };
        let (f0, f1) = (&self.frames[i0], &self.frames[i1]);
        let time = segment.times.0 + alpha * (segment.times.1 - segment.times.0);
        let span = f1.time() - f0.time();
        let frac = if span != 0.0 {
            ((time - f0.time()) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        LocalTetrad::interpolated(f0, f1, frac).map(Some)
    }
}
