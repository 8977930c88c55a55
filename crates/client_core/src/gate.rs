use std::time::{Duration, Instant};

use shared::domain::{BoardView, Delta, MoveIntent};
use tracing::{debug, info};

pub const DEFAULT_MIN_INPUT_INTERVAL: Duration = Duration::from_millis(70);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    NotMyTurn,
    SelfCapture,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unlocked,
    Locked(LockReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    TrialStarted { my_turn: bool },
    /// `turn_set` is true only when the update itself carried a `turn` field.
    AuthorityUpdate { my_turn: bool, turn_set: bool },
    SelfCapturePredicted,
    Terminal,
}

impl GateState {
    pub fn is_locked(self) -> bool {
        matches!(self, GateState::Locked(_))
    }

    pub fn transition(self, event: GateEvent) -> GateState {
        match (self, event) {
            (_, GateEvent::TrialStarted { my_turn: true }) => GateState::Unlocked,
            (_, GateEvent::TrialStarted { my_turn: false }) => {
                GateState::Locked(LockReason::NotMyTurn)
            }
            (_, GateEvent::Terminal) => GateState::Locked(LockReason::Terminal),
            // Terminal locks hold until the next trial starts.
            (GateState::Locked(LockReason::Terminal), _) => self,
            (_, GateEvent::SelfCapturePredicted) => GateState::Locked(LockReason::SelfCapture),
            (_, GateEvent::AuthorityUpdate { my_turn: false, .. }) => {
                GateState::Locked(LockReason::NotMyTurn)
            }
            (
                _,
                GateEvent::AuthorityUpdate {
                    my_turn: true,
                    turn_set: true,
                },
            ) => GateState::Unlocked,
            (
                _,
                GateEvent::AuthorityUpdate {
                    my_turn: true,
                    turn_set: false,
                },
            ) => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    RateLimited,
    Locked(LockReason),
    NoActiveTrial,
    PositionUnknown,
    OutOfBounds,
    OccupiedByOpponent,
    TargetReserved,
}

#[derive(Debug)]
pub struct MovementGate {
    state: GateState,
    min_interval: Duration,
    last_accepted: Option<Instant>,
}

impl MovementGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: GateState::Locked(LockReason::NotMyTurn),
            min_interval,
            last_accepted: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    fn apply(&mut self, event: GateEvent) -> GateState {
        let next = self.state.transition(event);
        if next != self.state {
            info!(from = ?self.state, to = ?next, event = ?event, "movement gate transition");
        }
        self.state = next;
        next
    }

    pub fn reset_for_trial(&mut self, view: &BoardView) -> GateState {
        self.apply(GateEvent::TrialStarted {
            my_turn: view.is_my_turn(),
        })
    }

    pub fn observe_update(&mut self, view: &BoardView, turn_set: bool, terminal: bool) -> GateState {
        if terminal {
            return self.apply(GateEvent::Terminal);
        }
        self.apply(GateEvent::AuthorityUpdate {
            my_turn: view.is_my_turn(),
            turn_set,
        })
    }

    pub fn lock_terminal(&mut self) -> GateState {
        self.apply(GateEvent::Terminal)
    }

    pub fn try_move(
        &mut self,
        view: Option<&BoardView>,
        delta: Delta,
        now: Instant,
    ) -> Result<MoveIntent, MoveRejection> {
        let outcome = self.check_move(view, delta, now);
        match &outcome {
            Ok(intent) => debug!(role = %intent.role, ?delta, "move intent accepted"),
            Err(reason) => debug!(?reason, ?delta, "move intent dropped"),
        }
        outcome
    }

    fn check_move(
        &mut self,
        view: Option<&BoardView>,
        delta: Delta,
        now: Instant,
    ) -> Result<MoveIntent, MoveRejection> {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.min_interval {
                return Err(MoveRejection::RateLimited);
            }
        }
        self.last_accepted = Some(now);

        if let GateState::Locked(reason) = self.state {
            return Err(MoveRejection::Locked(reason));
        }
        let view = view.ok_or(MoveRejection::NoActiveTrial)?;
        if !view.is_my_turn() {
            return Err(MoveRejection::Locked(LockReason::NotMyTurn));
        }
        let from = view.my_position().ok_or(MoveRejection::PositionUnknown)?;
        let to = from
            .offset(delta, view.size)
            .ok_or(MoveRejection::OutOfBounds)?;
        if view.opponent_position() == Some(to) {
            return Err(MoveRejection::OccupiedByOpponent);
        }

        let onto_target = view.target == Some(to);
        if onto_target && !view.i_am_capturer() {
            return Err(MoveRejection::TargetReserved);
        }
        if onto_target {
            self.apply(GateEvent::SelfCapturePredicted);
        }

        Ok(MoveIntent {
            role: view.my_role,
            delta,
        })
    }
}

impl Default for MovementGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INPUT_INTERVAL)
    }
}

#[cfg(test)]
#[path = "tests/gate_tests.rs"]
mod tests;
