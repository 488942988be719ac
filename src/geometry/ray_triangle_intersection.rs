use super::{BarycentricCoordinates, FloatType, Triangle, WorldPoint};

impl Triangle<WorldPoint> {
    /// Intersects the (two sided) triangle with the line through `p0` and `p1`.
    /// Returns the fraction along `p1 - p0` and barycentric uv coordinates of the hit,
    /// or `None` if the line misses or runs parallel to the triangle.
    /// Adapted from https://en.wikipedia.org/wiki/M%C3%B6ller%E2%80%93Trumbore_intersection_algorithm#Rust_implementation
    pub fn intersect_line(
        &self,
        p0: &WorldPoint,
        p1: &WorldPoint,
        parallel_epsilon: FloatType,
    ) -> Option<(FloatType, BarycentricCoordinates<FloatType>)> {
        let direction = p1 - p0;
        let [e1, e2] = self.edges();

        let ray_cross_e2 = direction.cross(&e2);
        let det = e1.dot(&ray_cross_e2);
        if det.abs() < parallel_epsilon {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = p0 - self[0];
        let u = inv_det * s.dot(&ray_cross_e2);

        let s_cross_e1 = s.cross(&e1);
        let v = inv_det * direction.dot(&s_cross_e1);
        let alpha = inv_det * e2.dot(&s_cross_e1);

        let uv = BarycentricCoordinates { u, v };
        uv.is_inside().then_some((alpha, uv))
    }
}
