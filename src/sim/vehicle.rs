//! Vehicle state and ground-plane kinematics

use uuid::Uuid;

use super::Command;

/// Distance travelled per tick while a movement flag is held
pub const CAR_SPEED: f32 = 0.1;
/// Heading change per tick while a turn flag is held (radians)
pub const CAR_TURN_RATE: f32 = 0.05;
/// Fixed height of every vehicle above the ground plane
pub const CAR_Y: f32 = 0.5;
/// Full health on spawn and respawn
pub const MAX_HEALTH: u32 = 100;
/// Spawn positions are randomized across the road width, at z = 0
pub const SPAWN_X_HALF_RANGE: f32 = 4.0;

/// Authoritative state of one participant's vehicle.
///
/// The id doubles as the participant id and is stable across
/// destroy/respawn cycles; the record is dropped only on leave.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: Uuid,
    pub x: f32,
    pub z: f32,
    /// Free-running heading in radians, accumulates without wrapping
    pub heading: f32,
    /// Always in [0, MAX_HEALTH]; 0 means destroyed (respawn pending)
    pub health: u32,
    /// Opaque display color assigned at join, immutable afterwards
    pub color: String,
    /// Tick of the last successful shot, None until the first one
    pub last_shot_tick: Option<u64>,
    /// Last applied movement command; the vehicle coasts on it
    pub command: Command,
}

impl Vehicle {
    pub fn new(id: Uuid, spawn_x: f32, color: String) -> Self {
        Self {
            id,
            x: spawn_x,
            z: 0.0,
            heading: 0.0,
            health: MAX_HEALTH,
            color,
            last_shot_tick: None,
            command: Command::default(),
        }
    }

    /// A destroyed vehicle ignores movement and fire until it respawns
    pub fn is_destroyed(&self) -> bool {
        self.health == 0
    }

    /// Apply damage, clamped at zero. Returns true when this hit
    /// transitioned the vehicle from active to destroyed.
    pub fn take_hit(&mut self, damage: u32) -> bool {
        let was_active = self.health > 0;
        self.health = self.health.saturating_sub(damage);
        was_active && self.health == 0
    }

    /// Reset in place for a respawn: full health, fresh position, heading
    /// zeroed, movement intent cleared. Identity and color are preserved.
    pub fn respawn(&mut self, spawn_x: f32) {
        self.health = MAX_HEALTH;
        self.x = spawn_x;
        self.z = 0.0;
        self.heading = 0.0;
        self.command = Command::default();
    }

    /// Advance one tick using the last applied command
    pub fn integrate(&mut self) {
        if self.is_destroyed() {
            return;
        }
        let (x, z, heading) = Kinematics::step(self.x, self.z, self.heading, &self.command);
        self.x = x;
        self.z = z;
        self.heading = heading;
    }
}

/// Pure per-tick movement rules
pub struct Kinematics;

impl Kinematics {
    /// Advance position and heading by one tick of the given command.
    /// Returns (new_x, new_z, new_heading).
    pub fn step(x: f32, z: f32, heading: f32, cmd: &Command) -> (f32, f32, f32) {
        let mut heading = heading;
        if cmd.left {
            heading += CAR_TURN_RATE;
        }
        if cmd.right {
            heading -= CAR_TURN_RATE;
        }

        // Backward reverses travel direction, not heading; holding both
        // flags cancels out.
        let direction = (cmd.forward as i8 - cmd.backward as i8) as f32;

        let mut x = x;
        let mut z = z;
        if cmd.forward || cmd.backward {
            x += heading.sin() * CAR_SPEED * direction;
            z += heading.cos() * CAR_SPEED * direction;
        }

        (x, z, heading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(forward: bool, backward: bool, left: bool, right: bool) -> Command {
        Command {
            forward,
            backward,
            left,
            right,
        }
    }

    #[test]
    fn forward_moves_along_heading() {
        let (x, z, heading) = Kinematics::step(0.0, 0.0, 0.0, &cmd(true, false, false, false));
        assert_eq!(heading, 0.0);
        assert!((x - 0.0).abs() < 1e-6);
        assert!((z - CAR_SPEED).abs() < 1e-6);
    }

    #[test]
    fn backward_reverses_travel_not_heading() {
        let (x, z, heading) = Kinematics::step(0.0, 0.0, 1.0, &cmd(false, true, false, false));
        assert_eq!(heading, 1.0);
        assert!((x + 1.0_f32.sin() * CAR_SPEED).abs() < 1e-6);
        assert!((z + 1.0_f32.cos() * CAR_SPEED).abs() < 1e-6);
    }

    #[test]
    fn both_movement_flags_cancel() {
        let (x, z, _) = Kinematics::step(3.0, -2.0, 0.7, &cmd(true, true, false, false));
        assert_eq!(x, 3.0);
        assert_eq!(z, -2.0);
    }

    #[test]
    fn turning_without_throttle_only_rotates() {
        let (x, z, heading) = Kinematics::step(1.0, 1.0, 0.0, &cmd(false, false, true, false));
        assert_eq!(x, 1.0);
        assert_eq!(z, 1.0);
        assert!((heading - CAR_TURN_RATE).abs() < 1e-6);
    }

    #[test]
    fn heading_is_free_running() {
        let mut heading = 0.0;
        let turn = cmd(false, false, true, false);
        for _ in 0..200 {
            let (_, _, h) = Kinematics::step(0.0, 0.0, heading, &turn);
            heading = h;
        }
        // Accumulates past a full turn instead of wrapping
        assert!(heading > std::f32::consts::TAU);
    }

    #[test]
    fn destroyed_vehicle_ignores_commands() {
        let mut v = Vehicle::new(Uuid::new_v4(), 0.0, "#ff0000".to_string());
        v.command = cmd(true, false, true, false);
        v.health = 0;
        v.integrate();
        assert_eq!(v.x, 0.0);
        assert_eq!(v.z, 0.0);
        assert_eq!(v.heading, 0.0);
    }

    #[test]
    fn take_hit_clamps_and_reports_destruction() {
        let mut v = Vehicle::new(Uuid::new_v4(), 0.0, "#00ff00".to_string());
        v.health = 5;
        assert!(v.take_hit(10));
        assert_eq!(v.health, 0);
        // Further hits stay clamped and do not re-report
        assert!(!v.take_hit(10));
        assert_eq!(v.health, 0);
    }

    #[test]
    fn respawn_preserves_identity() {
        let id = Uuid::new_v4();
        let mut v = Vehicle::new(id, 2.0, "#0000ff".to_string());
        v.health = 0;
        v.heading = 3.5;
        v.z = 40.0;
        v.respawn(-1.5);
        assert_eq!(v.id, id);
        assert_eq!(v.health, MAX_HEALTH);
        assert_eq!(v.x, -1.5);
        assert_eq!(v.z, 0.0);
        assert_eq!(v.heading, 0.0);
        assert_eq!(v.color, "#0000ff");
    }
}
