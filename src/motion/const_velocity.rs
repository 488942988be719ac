use nalgebra::{Matrix4, Rotation3, Unit};

use crate::{
    error::CoreError,
    geometry::{FloatType, SpacetimePoint, WorldVector, spatial_part, with_time},
};

#[derive(Clone, Debug, PartialEq)]
enum Step {
    /// Lorentz boost into a frame moving with velocity `beta`.
    Boost(Matrix4<FloatType>),
    /// Rotation of the object around `axis`, undone at each point's time.
    Rotation {
        axis: Unit<WorldVector>,
        angular_velocity: FloatType,
    },
}

/// Uniform motion composed of boosts and rotations, applied in the order they were added.
///
/// Maps points from the pseudo-Cartesian frame of the scene into the rest frame of the object.
/// Every step is affine at a fixed time slice, so segments stay straight.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstVelocity {
    steps: Vec<Step>,
}

impl ConstVelocity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_boost(&mut self, beta: &WorldVector) -> Result<&mut Self, CoreError> {
        self.steps.push(Step::Boost(boost_matrix(beta)?));
        Ok(self)
    }

    pub fn add_rotation(
        &mut self,
        axis: Unit<WorldVector>,
        angular_velocity: FloatType,
    ) -> &mut Self {
        self.steps.push(Step::Rotation {
            axis,
            angular_velocity,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn transform_point(&self, p: &SpacetimePoint) -> SpacetimePoint {
        self.steps.iter().fold(*p, |p, step| match step {
            Step::Boost(matrix) => SpacetimePoint::from(matrix * p.coords),
            Step::Rotation {
                axis,
                angular_velocity,
            } => {
                let rotation = Rotation3::from_axis_angle(axis, -angular_velocity * p[0]);
                with_time(p[0], &(rotation * spatial_part(&p)))
            }
        })
    }

    pub fn transformed_segment(
        &self,
        p0: &SpacetimePoint,
        p1: &SpacetimePoint,
    ) -> (SpacetimePoint, SpacetimePoint) {
        (self.transform_point(p0), self.transform_point(p1))
    }
}

/// Boost into a frame moving with velocity `beta` (in units of `c`).
pub fn boost_matrix(beta: &WorldVector) -> Result<Matrix4<FloatType>, CoreError> {
    let beta_squared = beta.norm_squared();
    if beta_squared >= 1.0 {
        return Err(CoreError::InvalidVelocity(beta_squared.sqrt()));
    }
    let gamma = 1.0 / (1.0 - beta_squared).sqrt();
    let k = gamma * gamma / (gamma + 1.0);

    let mut m = Matrix4::identity();
    m[(0, 0)] = gamma;
    for i in 0..3 {
        m[(0, i + 1)] = -gamma * beta[i];
        m[(i + 1, 0)] = -gamma * beta[i];
        for j in 0..3 {
            m[(i + 1, j + 1)] += k * beta[i] * beta[j];
        }
    }
    Ok(m)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{geometry::test::SpacetimePointWrapper, metric::natural_metric};
    use assert2::{assert, let_assert};
    use test_strategy::proptest;

    #[proptest]
    fn boost_then_inverse_boost_is_identity(p: SpacetimePointWrapper) {
        let mut motion = ConstVelocity::new();
        motion
            .add_boost(&WorldVector::new(0.5, 0.0, 0.0))
            .unwrap()
            .add_boost(&WorldVector::new(-0.5, 0.0, 0.0))
            .unwrap();
        let back = motion.transform_point(&p);
        assert!((back - *p).norm() < 1e-9 * (1.0 + p.coords.norm()));
    }

    #[test]
    fn boost_preserves_the_interval() {
        let_assert!(Ok(m) = boost_matrix(&WorldVector::new(0.3, -0.4, 0.6)));
        let eta = natural_metric(-1.0);
        assert!((m.transpose() * eta * m - eta).norm() < 1e-12);
    }

    #[test]
    fn moving_clock_is_at_rest_after_boost() {
        let mut motion = ConstVelocity::new();
        motion.add_boost(&WorldVector::new(0.6, 0.0, 0.0)).unwrap();
        let (a, b) = motion.transformed_segment(
            &SpacetimePoint::new(0.0, 0.0, 0.0, 0.0),
            &SpacetimePoint::new(1.0, 0.6, 0.0, 0.0),
        );
        assert!((b[1] - a[1]).abs() < 1e-12);
        // Time dilation, gamma = 1.25
        assert!((b[0] - a[0] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn rotation_depends_on_time() {
        let mut motion = ConstVelocity::new();
        motion.add_rotation(WorldVector::z_axis(), std::f64::consts::FRAC_PI_2);
        let p = motion.transform_point(&SpacetimePoint::new(1.0, 1.0, 0.0, 0.0));
        assert!((p - SpacetimePoint::new(1.0, 0.0, -1.0, 0.0)).norm() < 1e-12);
        let q = motion.transform_point(&SpacetimePoint::new(0.0, 1.0, 0.0, 0.0));
        assert!(q == SpacetimePoint::new(0.0, 1.0, 0.0, 0.0));
    }

    #[test]
    fn light_speed_is_rejected() {
        let mut motion = ConstVelocity::new();
        let_assert!(Err(CoreError::InvalidVelocity(v)) = motion.add_boost(&WorldVector::new(0.0, 1.0, 0.0)));
        assert!(v == 1.0);
        assert!(motion.is_empty());
    }
}
