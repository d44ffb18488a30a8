//! Arena simulation modules

pub mod collision;
pub mod projectile;
pub mod respawn;
pub mod snapshot;
pub mod vehicle;
pub mod world;

pub use world::{Arena, ArenaHandle, WorldState};

use crate::ws::protocol::ClientMsg;
use uuid::Uuid;

/// Participant input received from the replication boundary
#[derive(Debug, Clone)]
pub struct ParticipantInput {
    pub participant_id: Uuid,
    pub msg: ClientMsg,
    pub received_at: u64,
}

/// Movement intent held by a vehicle between ticks.
///
/// This is an idempotent snapshot: the latest command replaces the previous
/// one, and the vehicle coasts on it until a new one arrives. The one-shot
/// fire flag from the wire message is consumed at application time and never
/// stored here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Command {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}
