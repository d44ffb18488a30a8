//! Per-tick projectile-vehicle collision resolution

use std::collections::BTreeMap;
use uuid::Uuid;

use super::projectile::Projectile;
use super::vehicle::Vehicle;

/// Planar (x/z) distance below which a projectile hits a vehicle
pub const HIT_RADIUS: f32 = 1.5;
/// Health removed per hit
pub const HIT_DAMAGE: u32 = 10;

/// A resolved hit, reported back so the world can schedule respawns
#[derive(Debug, Clone)]
pub struct Hit {
    pub projectile_id: u64,
    pub owner_id: Uuid,
    pub target_id: Uuid,
    pub damage: u32,
    /// True when this hit drove the target's health to zero
    pub target_destroyed: bool,
}

/// Resolves collisions against a stable pre-tick view, then commits.
pub struct CollisionResolver;

impl CollisionResolver {
    /// Run one tick of resolution after all projectiles have been integrated.
    ///
    /// Target eligibility (health > 0) is read from a snapshot taken before
    /// any damage is committed, so no projectile observes another
    /// projectile's damage within the same tick. Each projectile resolves
    /// against the first eligible vehicle in iteration order and is then
    /// removed (first-match-wins, deliberately not area damage). Owners are
    /// never damaged by their own projectiles.
    pub fn resolve(
        projectiles: &mut Vec<Projectile>,
        vehicles: &mut BTreeMap<Uuid, Vehicle>,
    ) -> Vec<Hit> {
        struct TargetView {
            id: Uuid,
            x: f32,
            z: f32,
        }

        let targets: Vec<TargetView> = vehicles
            .values()
            .filter(|v| !v.is_destroyed())
            .map(|v| TargetView {
                id: v.id,
                x: v.x,
                z: v.z,
            })
            .collect();

        let mut pending: Vec<(u64, Uuid, Uuid)> = Vec::new();

        projectiles.retain(|p| {
            let hit = targets.iter().find(|t| {
                t.id != p.owner_id && planar_distance(p.x, p.z, t.x, t.z) < HIT_RADIUS
            });
            match hit {
                Some(t) => {
                    pending.push((p.id, p.owner_id, t.id));
                    false
                }
                None => true,
            }
        });

        // Commit phase: apply all damage after every projectile has resolved
        pending
            .into_iter()
            .map(|(projectile_id, owner_id, target_id)| {
                let target_destroyed = vehicles
                    .get_mut(&target_id)
                    .map(|v| v.take_hit(HIT_DAMAGE))
                    .unwrap_or(false);
                Hit {
                    projectile_id,
                    owner_id,
                    target_id,
                    damage: HIT_DAMAGE,
                    target_destroyed,
                }
            })
            .collect()
    }
}

fn planar_distance(x1: f32, z1: f32, x2: f32, z2: f32) -> f32 {
    let dx = x1 - x2;
    let dz = z1 - z2;
    (dx * dx + dz * dz).sqrt()
}
