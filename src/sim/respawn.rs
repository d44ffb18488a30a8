//! Deferred respawn scheduling via deadline entries

use uuid::Uuid;

/// Ticks between destruction and respawn (5 simulated seconds)
pub const RESPAWN_DELAY_TICKS: u64 = 100;

#[derive(Debug, Clone)]
struct RespawnEntry {
    vehicle_id: Uuid,
    due_tick: u64,
}

/// Pending respawns, stored as explicit deadlines and fired from inside the
/// regular tick rather than from out-of-band timers. Cancellation on leave
/// is just dropping the entry, so a removed vehicle can never be resurrected.
#[derive(Debug, Default)]
pub struct RespawnQueue {
    entries: Vec<RespawnEntry>,
}

impl RespawnQueue {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Schedule a respawn measured from the tick of destruction.
    /// A vehicle already pending keeps its original deadline.
    pub fn schedule(&mut self, vehicle_id: Uuid, destroyed_tick: u64) {
        if self.is_pending(vehicle_id) {
            return;
        }
        self.entries.push(RespawnEntry {
            vehicle_id,
            due_tick: destroyed_tick + RESPAWN_DELAY_TICKS,
        });
    }

    /// Drop any pending entry for a vehicle (participant left)
    pub fn cancel(&mut self, vehicle_id: Uuid) {
        self.entries.retain(|e| e.vehicle_id != vehicle_id);
    }

    pub fn is_pending(&self, vehicle_id: Uuid) -> bool {
        self.entries.iter().any(|e| e.vehicle_id == vehicle_id)
    }

    /// Remove and return every vehicle whose deadline has elapsed
    pub fn take_due(&mut self, now_tick: u64) -> Vec<Uuid> {
        let mut due = Vec::new();
        self.entries.retain(|e| {
            if now_tick >= e.due_tick {
                due.push(e.vehicle_id);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_at_deadline() {
        let id = Uuid::new_v4();
        let mut queue = RespawnQueue::new();
        queue.schedule(id, 10);

        assert!(queue.take_due(10 + RESPAWN_DELAY_TICKS - 1).is_empty());
        let due = queue.take_due(10 + RESPAWN_DELAY_TICKS);
        assert_eq!(due, vec![id]);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancel_drops_the_entry() {
        let id = Uuid::new_v4();
        let mut queue = RespawnQueue::new();
        queue.schedule(id, 0);
        queue.cancel(id);
        assert!(queue.take_due(u64::MAX).is_empty());
    }

    #[test]
    fn reschedule_keeps_original_deadline() {
        let id = Uuid::new_v4();
        let mut queue = RespawnQueue::new();
        queue.schedule(id, 0);
        queue.schedule(id, 50);
        assert_eq!(queue.take_due(RESPAWN_DELAY_TICKS), vec![id]);
        assert!(queue.is_empty());
    }

    #[test]
    fn independent_deadlines_per_vehicle() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut queue = RespawnQueue::new();
        queue.schedule(a, 0);
        queue.schedule(b, 20);

        assert_eq!(queue.take_due(RESPAWN_DELAY_TICKS), vec![a]);
        assert!(queue.is_pending(b));
        assert_eq!(queue.take_due(20 + RESPAWN_DELAY_TICKS), vec![b]);
    }
}
