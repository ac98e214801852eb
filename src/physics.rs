use bevy::math::Vec2;

use crate::collision::Aabb;
use crate::level::{Region, RegionCategory, RegionKind, RegionSet};
use crate::lock_gate::RegionLayer;

/// Gap left between a resolved body and the surface it was pushed out of.
const SEPARATION: f32 = 0.01;

/// The narrow slice of the player the progression core sees.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PlayerBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
}

impl PlayerBody {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            size,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }
}

/// Platformer physics over a region set. Platforms are always solid; lock
/// regions are solid only while the wall layer is [`RegionLayer::Locks`].
#[derive(Clone, Debug)]
pub struct PlatformerPhysics {
    gravity: f32,
    walls: RegionLayer,
}

impl PlatformerPhysics {
    pub fn new(gravity: f32, walls: RegionLayer) -> Self {
        Self { gravity, walls }
    }

    /// Swap the wall layer without rebuilding the world.
    pub fn rearm(&mut self, walls: RegionLayer) {
        self.walls = walls;
    }

    pub fn walls(&self) -> RegionLayer {
        self.walls
    }

    fn is_solid(&self, region: &Region) -> bool {
        match region.kind {
            RegionKind::Platform => true,
            RegionKind::Lock => self.walls == RegionLayer::Locks,
            _ => false,
        }
    }

    fn solid_hits<'a>(
        &'a self,
        bounds: Aabb,
        regions: &'a RegionSet,
    ) -> impl Iterator<Item = &'a Aabb> + 'a {
        regions
            .iter()
            .filter(move |r| self.is_solid(r) && r.bounds.overlaps(&bounds))
            .map(|r| &r.bounds)
    }

    pub fn on_ladder(&self, body: &PlayerBody, regions: &RegionSet) -> bool {
        regions.any_overlapping(&body.bounds(), RegionCategory::Ladder)
    }

    /// True when something solid lies within `y_distance` below the body.
    pub fn can_jump(&self, body: &PlayerBody, regions: &RegionSet, y_distance: f32) -> bool {
        let probe = body.bounds().offset(0.0, -y_distance);
        self.solid_hits(probe, regions).next().is_some()
    }

    /// Advance one step. `frames` scales per-frame velocities (1.0 at 60 Hz).
    pub fn step(&self, body: &mut PlayerBody, regions: &RegionSet, frames: f32) {
        if !self.on_ladder(body, regions) {
            body.velocity.y -= self.gravity * frames;
        }

        // Separate axis resolution, X first.
        let dx = body.velocity.x * frames;
        if dx != 0.0 {
            body.position.x += dx;
            let half_w = body.size.x / 2.0;
            let hits = self.solid_hits(body.bounds(), regions);
            if dx > 0.0 {
                if let Some(edge) = hits.map(Aabb::min_x).reduce(f32::min) {
                    body.position.x = edge - half_w - SEPARATION;
                }
            } else if let Some(edge) = hits.map(Aabb::max_x).reduce(f32::max) {
                body.position.x = edge + half_w + SEPARATION;
            }
        }

        let dy = body.velocity.y * frames;
        if dy != 0.0 {
            body.position.y += dy;
            let half_h = body.size.y / 2.0;
            let hits = self.solid_hits(body.bounds(), regions);
            let landed = if dy < 0.0 {
                hits.map(Aabb::max_y)
                    .reduce(f32::max)
                    .map(|top| top + half_h + SEPARATION)
            } else {
                hits.map(Aabb::min_y)
                    .reduce(f32::min)
                    .map(|bottom| bottom - half_h - SEPARATION)
            };
            if let Some(y) = landed {
                body.position.y = y;
                body.velocity.y = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Vec2 = Vec2::new(48.0, 64.0);

    fn regions() -> RegionSet {
        RegionSet::new(vec![
            Region::new(
                RegionKind::Platform,
                Aabb::from_corners(0.0, 150.0, 1000.0, 250.0),
            ),
            Region::new(
                RegionKind::Lock,
                Aabb::from_corners(400.0, 250.0, 440.0, 450.0),
            ),
            Region::new(
                RegionKind::Ladder,
                Aabb::from_corners(700.0, 250.0, 740.0, 600.0),
            ),
        ])
    }

    fn settle(physics: &PlatformerPhysics, body: &mut PlayerBody, set: &RegionSet) {
        for _ in 0..30 {
            physics.step(body, set, 1.0);
        }
    }

    #[test]
    fn body_lands_on_platform() {
        let set = regions();
        let physics = PlatformerPhysics::new(1.2, RegionLayer::Locks);
        let mut body = PlayerBody::new(Vec2::new(128.0, 286.0), SIZE);
        assert!(!physics.can_jump(&body, &set, 1.0));

        settle(&physics, &mut body, &set);

        assert!((body.bounds().min_y() - 250.0).abs() < 0.1);
        assert!(physics.can_jump(&body, &set, 10.0));
    }

    #[test]
    fn locks_block_until_rearmed() {
        let set = regions();
        let mut physics = PlatformerPhysics::new(1.2, RegionLayer::Locks);
        let mut body = PlayerBody::new(Vec2::new(360.0, 283.0), SIZE);
        settle(&physics, &mut body, &set);

        for _ in 0..10 {
            body.velocity.x = 10.0;
            physics.step(&mut body, &set, 1.0);
        }
        assert!(body.bounds().max_x() < 400.0);
        assert!(!body.bounds().overlaps(&Aabb::from_corners(400.0, 250.0, 440.0, 450.0)));

        physics.rearm(RegionLayer::Placeholder);
        for _ in 0..10 {
            body.velocity.x = 10.0;
            physics.step(&mut body, &set, 1.0);
        }
        assert!(body.position.x > 440.0);
    }

    #[test]
    fn ladders_cancel_gravity() {
        let set = regions();
        let physics = PlatformerPhysics::new(1.2, RegionLayer::Locks);
        let mut body = PlayerBody::new(Vec2::new(720.0, 400.0), SIZE);
        assert!(physics.on_ladder(&body, &set));

        physics.step(&mut body, &set, 1.0);
        assert_eq!(body.position.y, 400.0);
        assert_eq!(body.velocity.y, 0.0);
    }
}
