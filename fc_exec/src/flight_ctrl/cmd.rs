//! # Command channel
//!
//! Commands, retune requests and engage triggers are produced asynchronously
//! (from the telecommand server or a flight script) while the control tick
//! consumes them. Each input gets a single-slot cell holding the latest
//! posted value: only the most recent command is ever meaningful to a
//! physical controller, so last-write-wins replacement is the correct policy
//! and no queueing is needed.
//!
//! A cell is replaced and consumed whole, so a multi-field write (such as the
//! four gain fields of a retune) is never observed half-applied.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::{Arc, Mutex};

// Internal
use comms_if::tc::flight_ctrl::{GainTune, Twist};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single-slot cell holding the latest value posted by an asynchronous
/// writer.
#[derive(Debug, Clone)]
pub struct LatestCell<T> {
    slot: Arc<Mutex<Option<T>>>
}

/// The set of command cells consumed by the control tick.
///
/// Cloning the channel shares the underlying cells, so a clone can be handed
/// to the telecommand processor as the writing end.
#[derive(Debug, Clone, Default)]
pub struct CommandChannel {
    velocity: LatestCell<Twist>,
    position: LatestCell<Twist>,
    gain_tune: LatestCell<GainTune>,
    engage: LatestCell<EngageCmd>
}

/// A snapshot of all command cells, taken once at the start of a tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandSnapshot {
    pub velocity: Option<Twist>,
    pub position: Option<Twist>,
    pub gain_tune: Option<GainTune>,
    pub engage: Option<EngageCmd>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An engage or shutdown trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngageCmd {
    Engage,
    Shutdown
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> Default for LatestCell<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None))
        }
    }
}

impl<T> LatestCell<T> {

    /// Post a new value into the cell, replacing any unconsumed one.
    pub fn post(&self, value: T) {
        let mut slot = self.slot.lock()
            .expect("LatestCell mutex poisoned");

        *slot = Some(value);
    }

    /// Take the latest value out of the cell, leaving it empty.
    pub fn take(&self) -> Option<T> {
        let mut slot = self.slot.lock()
            .expect("LatestCell mutex poisoned");

        slot.take()
    }
}

impl CommandChannel {

    /// Post a new velocity command.
    pub fn post_velocity(&self, cmd: Twist) {
        self.velocity.post(cmd);
    }

    /// Post a new position command.
    pub fn post_position(&self, cmd: Twist) {
        self.position.post(cmd);
    }

    /// Post a new retune request.
    pub fn post_gain_tune(&self, tune: GainTune) {
        self.gain_tune.post(tune);
    }

    /// Post an engage or shutdown trigger.
    pub fn post_engage(&self, cmd: EngageCmd) {
        self.engage.post(cmd);
    }

    /// Consume all cells, returning the latest value of each.
    ///
    /// Called exactly once at the start of each tick.
    pub fn snapshot(&self) -> CommandSnapshot {
        CommandSnapshot {
            velocity: self.velocity.take(),
            position: self.position.take(),
            gain_tune: self.gain_tune.take(),
            engage: self.engage.take()
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let cell = LatestCell::default();

        cell.post(1);
        cell.post(2);
        cell.post(3);

        assert_eq!(cell.take(), Some(3));
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn test_snapshot_consumes_cells() {
        let channel = CommandChannel::default();
        let writer = channel.clone();

        writer.post_velocity(Twist {
            linear: [1.0, 0.0, 0.0],
            angular: [0.0; 3]
        });
        writer.post_engage(EngageCmd::Engage);

        let snapshot = channel.snapshot();
        assert!(snapshot.velocity.is_some());
        assert!(snapshot.position.is_none());
        assert_eq!(snapshot.engage, Some(EngageCmd::Engage));

        // A second snapshot sees nothing new
        let snapshot = channel.snapshot();
        assert!(snapshot.velocity.is_none());
        assert!(snapshot.engage.is_none());
    }

    #[test]
    fn test_tune_consumed_whole() {
        let channel = CommandChannel::default();

        channel.post_gain_tune(GainTune {
            axis: 5,
            gain_p: 1.0,
            gain_d: 2.0,
            gain_i: 3.0,
            time_constant: 4.0
        });

        let tune = channel.snapshot().gain_tune.unwrap();
        assert_eq!(
            (tune.axis, tune.gain_p, tune.gain_d, tune.gain_i, tune.time_constant),
            (5, 1.0, 2.0, 3.0, 4.0)
        );
    }
}
