//! Projectile lifecycle - cooldown-gated fire, integration, expiry

use uuid::Uuid;

use super::vehicle::Vehicle;

/// Distance travelled per tick
pub const BULLET_SPEED: f32 = 0.5;
/// Fixed spawn height above the ground plane
pub const BULLET_Y: f32 = 1.0;
/// Spawn offset ahead of the firing vehicle, along its heading
pub const MUZZLE_OFFSET: f32 = 2.0;
/// Minimum ticks between two successful shots by the same vehicle (500ms)
pub const FIRE_COOLDOWN_TICKS: u64 = 10;
/// Ticks a projectile lives before unconditional removal (3 seconds)
pub const BULLET_TTL_TICKS: u64 = 60;

/// A live projectile. Velocity is fixed at spawn and never altered.
#[derive(Debug, Clone)]
pub struct Projectile {
    /// Sequential id assigned by the world's counter
    pub id: u64,
    /// Vehicle that fired it; immune to its own shots
    pub owner_id: Uuid,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    /// Tick the projectile was spawned on, for TTL expiry
    pub spawned_tick: u64,
}

impl Projectile {
    /// Attempt to fire from a vehicle at the given tick.
    ///
    /// Produces nothing while the vehicle is destroyed or still inside the
    /// re-fire cooldown window. On success the vehicle's last-shot tick is
    /// updated and the projectile spawns at the muzzle offset along the
    /// vehicle's heading, travelling the same direction at fixed speed.
    pub fn fire(vehicle: &mut Vehicle, now_tick: u64, id: u64) -> Option<Projectile> {
        if vehicle.is_destroyed() {
            return None;
        }
        if let Some(last) = vehicle.last_shot_tick {
            if now_tick.saturating_sub(last) < FIRE_COOLDOWN_TICKS {
                return None;
            }
        }
        vehicle.last_shot_tick = Some(now_tick);

        let sin = vehicle.heading.sin();
        let cos = vehicle.heading.cos();
        Some(Projectile {
            id,
            owner_id: vehicle.id,
            x: vehicle.x + sin * MUZZLE_OFFSET,
            y: BULLET_Y,
            z: vehicle.z + cos * MUZZLE_OFFSET,
            vx: sin * BULLET_SPEED,
            vy: 0.0,
            vz: cos * BULLET_SPEED,
            spawned_tick: now_tick,
        })
    }

    /// Advance one tick along the fixed velocity
    pub fn integrate(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.z += self.vz;
    }

    /// True once the time-to-live has elapsed
    pub fn is_expired(&self, now_tick: u64) -> bool {
        now_tick.saturating_sub(self.spawned_tick) >= BULLET_TTL_TICKS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn vehicle() -> Vehicle {
        Vehicle::new(Uuid::new_v4(), 0.0, "#abcdef".to_string())
    }

    #[test]
    fn first_shot_always_allowed() {
        let mut v = vehicle();
        let p = Projectile::fire(&mut v, 0, 1).expect("first shot");
        assert_eq!(p.owner_id, v.id);
        assert_eq!(v.last_shot_tick, Some(0));
    }

    #[test]
    fn cooldown_blocks_second_shot() {
        let mut v = vehicle();
        assert!(Projectile::fire(&mut v, 0, 1).is_some());
        assert!(Projectile::fire(&mut v, 1, 2).is_none());
        assert!(Projectile::fire(&mut v, FIRE_COOLDOWN_TICKS - 1, 2).is_none());
        assert!(Projectile::fire(&mut v, FIRE_COOLDOWN_TICKS, 2).is_some());
    }

    #[test]
    fn destroyed_vehicle_cannot_fire() {
        let mut v = vehicle();
        v.health = 0;
        assert!(Projectile::fire(&mut v, 50, 1).is_none());
        assert_eq!(v.last_shot_tick, None);
    }

    #[test]
    fn spawns_ahead_of_vehicle_along_heading() {
        let mut v = vehicle();
        v.heading = std::f32::consts::FRAC_PI_2; // facing +x
        let p = Projectile::fire(&mut v, 0, 1).unwrap();
        assert!((p.x - MUZZLE_OFFSET).abs() < 1e-4);
        assert!(p.z.abs() < 1e-4);
        assert!((p.vx - BULLET_SPEED).abs() < 1e-4);
        assert!(p.vz.abs() < 1e-4);
        assert_eq!(p.y, BULLET_Y);
    }

    #[test]
    fn integrates_with_fixed_velocity() {
        let mut v = vehicle();
        let mut p = Projectile::fire(&mut v, 0, 1).unwrap();
        let (x0, z0) = (p.x, p.z);
        p.integrate();
        p.integrate();
        assert!((p.x - (x0 + 2.0 * p.vx)).abs() < 1e-5);
        assert!((p.z - (z0 + 2.0 * p.vz)).abs() < 1e-5);
    }

    #[test]
    fn expires_exactly_at_ttl() {
        let mut v = vehicle();
        let p = Projectile::fire(&mut v, 5, 1).unwrap();
        assert!(!p.is_expired(5 + BULLET_TTL_TICKS - 1));
        assert!(p.is_expired(5 + BULLET_TTL_TICKS));
    }
}
