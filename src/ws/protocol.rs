//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Request to join the arena
    Join,

    /// Movement intent snapshot for the local participant.
    /// Latest message wins; there is no input queue.
    Input {
        /// Drive forward
        forward: bool,
        /// Drive backward (reverses travel, not heading)
        backward: bool,
        /// Turn left
        left: bool,
        /// Turn right
        right: bool,
        /// One-shot fire request, consumed on application
        fire: bool,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },

    /// Leave the arena
    Leave,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        participant_id: Uuid,
        server_time: u64,
    },

    /// Confirmation of arena join, carrying the new vehicle's state
    Joined { vehicle: VehicleSnapshot },

    /// Another participant joined the arena
    ParticipantJoined { vehicle: VehicleSnapshot },

    /// A participant left the arena
    ParticipantLeft { participant_id: Uuid },

    /// World state snapshot (sent at regular intervals)
    Snapshot(WorldSnapshot),

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Fully-copied view of the world, safe to hand to any observer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Simulation tick the snapshot was taken at
    pub tick: u64,
    pub vehicles: Vec<VehicleSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub barrier: BarrierSnapshot,
}

/// Vehicle state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: Uuid,
    pub x: f32,
    /// Fixed ground-plane height, included so observers need no constant
    pub y: f32,
    pub z: f32,
    /// Heading in radians, free-running
    pub heading: f32,
    /// Health (0-100); 0 means destroyed, awaiting respawn
    pub health: u32,
    /// Display color assigned at join
    pub color: String,
    /// Tick of the last successful shot, if any
    pub last_shot_tick: Option<u64>,
}

/// Projectile state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub owner_id: Uuid,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
}

/// Shared moving barrier state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarrierSnapshot {
    pub x: f32,
    pub z: f32,
    /// +1 or -1, reversing at the configured bounds
    pub dir: i8,
}
