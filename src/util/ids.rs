//! Identifiers for scene surfaces and rays.
//!
//! Ids come from an explicit generator handed to constructors, so independent scenes
//! (and tests) never share hidden counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RayId(pub u64);

#[derive(Debug, Default)]
pub struct IdGenerator {
    next_surface: AtomicU64,
    next_ray: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&self) -> SurfaceId {
        SurfaceId(self.next_surface.fetch_add(1, Ordering::Relaxed))
    }

    pub fn ray(&self) -> RayId {
        RayId(self.next_ray.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn ids_are_unique_per_kind() {
        let ids = IdGenerator::new();
        let a = ids.surface();
        let b = ids.surface();
        assert!(a != b);
        assert!(ids.ray() == RayId(0));
        assert!(ids.ray() == RayId(1));
    }

    #[test]
    fn generators_are_independent() {
        let first = IdGenerator::new();
        let second = IdGenerator::new();
        first.surface();
        assert!(second.surface() == SurfaceId(0));
    }

    #[test]
    fn shared_between_threads() {
        let ids = IdGenerator::new();
        let mut all: Vec<SurfaceId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..100).map(|_| ids.surface()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });
        all.sort();
        all.dedup();
        assert!(all.len() == 400);
    }
}
