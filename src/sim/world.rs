//! World state and authoritative tick loop

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info};
use uuid::Uuid;

use crate::util::time::{SIMULATION_TPS, SNAPSHOT_TPS, TICK_DURATION_MICROS};
use crate::ws::protocol::{
    BarrierSnapshot, ClientMsg, ProjectileSnapshot, ServerMsg, VehicleSnapshot, WorldSnapshot,
};

use super::collision::{CollisionResolver, Hit};
use super::projectile::Projectile;
use super::respawn::RespawnQueue;
use super::snapshot::SnapshotBuilder;
use super::vehicle::{Vehicle, CAR_Y, SPAWN_X_HALF_RANGE};
use super::{Command, ParticipantInput};

/// Barrier movement per tick
pub const BARRIER_SPEED: f32 = 0.1;
/// Barrier reverses direction beyond this x extent
pub const BARRIER_BOUND: f32 = 15.0;
/// Fixed z position of the barrier
pub const BARRIER_Z: f32 = -50.0;

/// The shared moving barrier, independent of all vehicles
#[derive(Debug, Clone)]
pub struct Barrier {
    pub x: f32,
    pub z: f32,
    pub dir: i8,
}

impl Barrier {
    fn new() -> Self {
        Self {
            x: 0.0,
            z: BARRIER_Z,
            dir: 1,
        }
    }

    /// Advance one tick, reversing at the bounds
    fn integrate(&mut self) {
        self.x += BARRIER_SPEED * self.dir as f32;
        if self.x.abs() > BARRIER_BOUND {
            self.dir = -self.dir;
        }
    }
}

/// What happened during one tick, reported for logging and tests
#[derive(Debug, Default)]
pub struct TickReport {
    pub hits: Vec<Hit>,
    pub respawned: Vec<Uuid>,
}

/// Authoritative world state (owned by the arena task).
///
/// This is the single source of truth: every mutation goes through the
/// operations below, and observers only ever receive copies. None of the
/// operations fail for well-formed input; unknown participant ids are
/// silently ignored since leave/join races are routine in networked play.
pub struct WorldState {
    pub tick: u64,
    pub vehicles: BTreeMap<Uuid, Vehicle>,
    pub projectiles: Vec<Projectile>,
    pub barrier: Barrier,
    respawns: RespawnQueue,
    next_projectile_id: u64,
    rng: ChaCha8Rng,
}

impl WorldState {
    pub fn new(seed: u64) -> Self {
        Self {
            tick: 0,
            vehicles: BTreeMap::new(),
            projectiles: Vec::new(),
            barrier: Barrier::new(),
            respawns: RespawnQueue::new(),
            next_projectile_id: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn generate_spawn_x(&mut self) -> f32 {
        self.rng.gen_range(-SPAWN_X_HALF_RANGE..SPAWN_X_HALF_RANGE)
    }

    fn generate_color(&mut self) -> String {
        format!("#{:06x}", self.rng.gen_range(0..0x100_0000u32))
    }

    /// Insert a new vehicle for a participant. Never fails; joining twice
    /// keeps the existing vehicle untouched.
    pub fn join(&mut self, participant_id: Uuid) -> VehicleSnapshot {
        if !self.vehicles.contains_key(&participant_id) {
            let spawn_x = self.generate_spawn_x();
            let color = self.generate_color();
            self.vehicles
                .insert(participant_id, Vehicle::new(participant_id, spawn_x, color));
        }
        vehicle_snapshot(&self.vehicles[&participant_id])
    }

    /// Remove a participant's vehicle, cancel any pending respawn, and drop
    /// its in-flight projectiles so nothing attributable to it lingers.
    /// Idempotent: leaving twice or leaving while never joined is a no-op.
    pub fn leave(&mut self, participant_id: Uuid) {
        if self.vehicles.remove(&participant_id).is_none() {
            return;
        }
        self.respawns.cancel(participant_id);
        self.projectiles.retain(|p| p.owner_id != participant_id);
    }

    /// Replace the stored command for a participant. The fire flag is
    /// edge-triggered: it is consumed here, spawning a projectile
    /// synchronously when the vehicle is active and off cooldown.
    /// Destroyed vehicles ignore commands entirely until they respawn.
    pub fn apply_command(&mut self, participant_id: Uuid, command: Command, fire: bool) {
        let now = self.tick;
        let next_id = self.next_projectile_id;
        if let Some(vehicle) = self.vehicles.get_mut(&participant_id) {
            if vehicle.is_destroyed() {
                return;
            }
            vehicle.command = command;
            if fire {
                if let Some(projectile) = Projectile::fire(vehicle, now, next_id) {
                    self.next_projectile_id += 1;
                    self.projectiles.push(projectile);
                }
            }
        }
    }

    /// Advance the world by one tick, in a fixed order: vehicle kinematics,
    /// projectile integration, collision resolution, TTL expiry, barrier
    /// movement, due respawns. The tick counter increments last.
    pub fn tick(&mut self) -> TickReport {
        let now = self.tick;

        for vehicle in self.vehicles.values_mut() {
            vehicle.integrate();
        }

        for projectile in self.projectiles.iter_mut() {
            projectile.integrate();
        }

        let hits = CollisionResolver::resolve(&mut self.projectiles, &mut self.vehicles);

        for hit in &hits {
            if hit.target_destroyed {
                self.respawns.schedule(hit.target_id, now);
            }
        }

        self.projectiles.retain(|p| !p.is_expired(now));

        self.barrier.integrate();

        let mut respawned = Vec::new();
        for vehicle_id in self.respawns.take_due(now) {
            let spawn_x = self.generate_spawn_x();
            if let Some(vehicle) = self.vehicles.get_mut(&vehicle_id) {
                vehicle.respawn(spawn_x);
                respawned.push(vehicle_id);
            }
        }

        self.tick += 1;

        TickReport { hits, respawned }
    }

    /// Read-only, fully-copied view of the world
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            vehicles: self.vehicles.values().map(vehicle_snapshot).collect(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| ProjectileSnapshot {
                    id: p.id,
                    owner_id: p.owner_id,
                    x: p.x,
                    y: p.y,
                    z: p.z,
                    vx: p.vx,
                    vy: p.vy,
                    vz: p.vz,
                })
                .collect(),
            barrier: BarrierSnapshot {
                x: self.barrier.x,
                z: self.barrier.z,
                dir: self.barrier.dir,
            },
        }
    }
}

fn vehicle_snapshot(vehicle: &Vehicle) -> VehicleSnapshot {
    VehicleSnapshot {
        id: vehicle.id,
        x: vehicle.x,
        y: CAR_Y,
        z: vehicle.z,
        heading: vehicle.heading,
        health: vehicle.health,
        color: vehicle.color.clone(),
        last_shot_tick: vehicle.last_shot_tick,
    }
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    pub input_tx: mpsc::Sender<ParticipantInput>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
    pub participant_count: Arc<AtomicUsize>,
}

impl ArenaHandle {
    pub fn participant_count(&self) -> usize {
        self.participant_count.load(Ordering::Relaxed)
    }
}

/// The authoritative arena: a single task owning the world state and
/// serializing joins, leaves and commands through one input channel.
pub struct Arena {
    state: WorldState,
    input_rx: mpsc::Receiver<ParticipantInput>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
    participant_count: Arc<AtomicUsize>,
}

impl Arena {
    pub fn new(seed: u64) -> (Self, ArenaHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);
        let participant_count = Arc::new(AtomicUsize::new(0));

        let handle = ArenaHandle {
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
            participant_count: participant_count.clone(),
        };

        let snapshot_interval = SIMULATION_TPS / SNAPSHOT_TPS;
        let arena = Self {
            state: WorldState::new(seed),
            input_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval),
            participant_count,
        };

        (arena, handle)
    }

    /// Run the authoritative tick loop. The arena ticks forever on its own
    /// clock, independent of any participant's frame rate; the barrier keeps
    /// moving even with nobody connected.
    pub async fn run(mut self) {
        info!(tps = SIMULATION_TPS, "Arena started");

        let tick_duration = Duration::from_micros(TICK_DURATION_MICROS);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            self.process_inputs();

            let report = self.state.tick();
            self.log_report(&report);

            if self.snapshot_builder.should_send() {
                let snapshot = self.snapshot_builder.build(&self.state);
                let _ = self.snapshot_tx.send(snapshot);
            }
        }
    }

    /// Drain all pending inputs from participants
    fn process_inputs(&mut self) {
        while let Ok(input) = self.input_rx.try_recv() {
            match input.msg {
                ClientMsg::Join => {
                    self.handle_join(input.participant_id);
                }
                ClientMsg::Input {
                    forward,
                    backward,
                    left,
                    right,
                    fire,
                } => {
                    let command = Command {
                        forward,
                        backward,
                        left,
                        right,
                    };
                    self.state.apply_command(input.participant_id, command, fire);
                }
                ClientMsg::Ping { t } => {
                    let _ = self.snapshot_tx.send(ServerMsg::Pong { t });
                }
                ClientMsg::Leave => {
                    self.handle_leave(input.participant_id);
                }
            }
        }
    }

    fn handle_join(&mut self, participant_id: Uuid) {
        let already_joined = self.state.vehicles.contains_key(&participant_id);
        let vehicle = self.state.join(participant_id);
        self.participant_count
            .store(self.state.vehicles.len(), Ordering::Relaxed);

        if already_joined {
            debug!(participant_id = %participant_id, "Participant already in arena");
        } else {
            let _ = self.snapshot_tx.send(ServerMsg::ParticipantJoined {
                vehicle: vehicle.clone(),
            });
            info!(
                participant_id = %participant_id,
                participant_count = self.state.vehicles.len(),
                "Participant joined arena"
            );
        }

        let _ = self.snapshot_tx.send(ServerMsg::Joined { vehicle });

        // New observers should not wait out the cadence for their first view
        self.snapshot_builder.force_next();
    }

    fn handle_leave(&mut self, participant_id: Uuid) {
        if !self.state.vehicles.contains_key(&participant_id) {
            return;
        }
        self.state.leave(participant_id);
        self.participant_count
            .store(self.state.vehicles.len(), Ordering::Relaxed);

        let _ = self
            .snapshot_tx
            .send(ServerMsg::ParticipantLeft { participant_id });

        info!(
            participant_id = %participant_id,
            participant_count = self.state.vehicles.len(),
            "Participant left arena"
        );
    }

    fn log_report(&self, report: &TickReport) {
        for hit in &report.hits {
            debug!(
                projectile_id = hit.projectile_id,
                owner_id = %hit.owner_id,
                target_id = %hit.target_id,
                damage = hit.damage,
                "Projectile hit"
            );
            if hit.target_destroyed {
                info!(participant_id = %hit.target_id, "Vehicle destroyed, respawn scheduled");
            }
        }
        for vehicle_id in &report.respawned {
            info!(participant_id = %vehicle_id, "Vehicle respawned");
        }
    }
}
