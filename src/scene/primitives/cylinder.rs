use crate::{
    geometry::{FloatType, SlabHit, TexturePoint, WorldBox, WorldPoint, WorldVector, solve_quadratic},
    scene::Shape,
};

use super::azimuth_fraction;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum CylinderFace {
    Bottom = 0,
    Top = 1,
    Side = 2,
}

/// Closed cylinder of radius 1 around the z axis, between `z = 0` and `z = 1`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Cylinder;

impl Shape for Cylinder {
    fn local_bounds(&self) -> WorldBox {
        WorldBox::new(WorldPoint::new(-1.0, -1.0, 0.0), WorldPoint::new(1.0, 1.0, 1.0))
    }

    fn tentry_texit(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        t0: FloatType,
        t1: FloatType,
        parallel_epsilon: FloatType,
    ) -> Option<SlabHit> {
        let d = p1 - p0;

        let mut entry = (FloatType::NEG_INFINITY, CylinderFace::Side);
        let mut exit = (FloatType::INFINITY, CylinderFace::Side);

        if d.x.abs() < parallel_epsilon && d.y.abs() < parallel_epsilon {
            if p0.x * p0.x + p0.y * p0.y > 1.0 {
                return None;
            }
        } else {
            let roots = solve_quadratic(
                d.x * d.x + d.y * d.y,
                2.0 * (p0.x * d.x + p0.y * d.y),
                p0.x * p0.x + p0.y * p0.y - 1.0,
            );
            let [near, far] = roots.as_slice() else {
                return None;
            };
            entry.0 = *near;
            exit.0 = *far;
        }

        if d.z.abs() < parallel_epsilon {
            if p0.z < 0.0 || p0.z > 1.0 {
                return None;
            }
        } else {
            let mut to_bottom = (-p0.z / d.z, CylinderFace::Bottom);
            let mut to_top = ((1.0 - p0.z) / d.z, CylinderFace::Top);
            if to_bottom.0 > to_top.0 {
                std::mem::swap(&mut to_bottom, &mut to_top);
            }
            if to_bottom.0 > entry.0 {
                entry = to_bottom;
            }
            if to_top.0 < exit.0 {
                exit = to_top;
            }
        }

        if entry.0 > exit.0 || !entry.0.is_finite() || !exit.0.is_finite() {
            return None;
        }

        Some(SlabHit::from_alphas(
            entry.0,
            exit.0,
            entry.1 as usize,
            exit.1 as usize,
            t0,
            t1,
        ))
    }

    fn normal(&self, p: &WorldPoint, part: usize) -> WorldVector {
        match part {
            0 => -WorldVector::z(),
            1 => WorldVector::z(),
            _ => WorldVector::new(p.x, p.y, 0.0),
        }
    }

    fn tex_uv(&self, p: &WorldPoint, part: usize) -> TexturePoint {
        match part {
            0 | 1 => TexturePoint::new((p.x + 1.0) / 2.0, (p.y + 1.0) / 2.0),
            _ => TexturePoint::new(azimuth_fraction(p), p.z),
        }
    }

    fn is_solid(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::{assert, let_assert};
    use test_case::test_case;

    const PARALLEL: FloatType = 1e-12;

    #[test]
    fn through_the_side() {
        let hit = Cylinder.tentry_texit(
            &WorldPoint::new(-2.0, 0.0, 0.5),
            &WorldPoint::new(2.0, 0.0, 0.5),
            0.0,
            1.0,
            PARALLEL,
        );
        let_assert!(Some(hit) = hit);
        assert!((hit.t_entry - 0.25).abs() < 1e-12);
        assert!((hit.t_exit - 0.75).abs() < 1e-12);
        assert!(hit.face_entry == CylinderFace::Side as usize);
    }

    #[test]
    fn along_the_axis() {
        let hit = Cylinder.tentry_texit(
            &WorldPoint::new(0.5, 0.0, 2.0),
            &WorldPoint::new(0.5, 0.0, -2.0),
            0.0,
            4.0,
            PARALLEL,
        );
        let_assert!(Some(hit) = hit);
        assert!((hit.t_entry - 1.0).abs() < 1e-12);
        assert!((hit.t_exit - 2.0).abs() < 1e-12);
        assert!(hit.face_entry == CylinderFace::Top as usize);
        assert!(hit.face_exit == CylinderFace::Bottom as usize);
    }

    #[test]
    fn slanted_through_cap_and_side() {
        let hit = Cylinder.tentry_texit(
            &WorldPoint::new(0.0, 0.0, 2.0),
            &WorldPoint::new(2.0, 0.0, 0.0),
            0.0,
            1.0,
            PARALLEL,
        );
        let_assert!(Some(hit) = hit);
        assert!((hit.t_entry - 0.5).abs() < 1e-12);
        assert!(hit.face_entry == CylinderFace::Top as usize);
        assert!(hit.face_exit == CylinderFace::Side as usize);
    }

    #[test_case(2.0, 0.0, 0.5,   0.0, 0.0, 1.0 ; "parallel_outside")]
    #[test_case(-2.0, 0.0, 1.5,  1.0, 0.0, 0.0 ; "above")]
    #[test_case(-2.0, 1.5, 0.5,  1.0, 0.0, 0.0 ; "beside")]
    fn misses(px: FloatType, py: FloatType, pz: FloatType, dx: FloatType, dy: FloatType, dz: FloatType) {
        let p0 = WorldPoint::new(px, py, pz);
        let p1 = p0 + WorldVector::new(dx, dy, dz);
        assert!(Cylinder.tentry_texit(&p0, &p1, 0.0, 1.0, PARALLEL).is_none());
    }

    #[test]
    fn side_normal_is_radial() {
        let n = Cylinder.normal(&WorldPoint::new(0.6, 0.8, 0.3), CylinderFace::Side as usize);
        assert!(n == WorldVector::new(0.6, 0.8, 0.0));
    }
}
