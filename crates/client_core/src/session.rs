use std::time::Instant;

use chrono::{DateTime, Utc};
use shared::{
    domain::{BoardView, Direction, MoveIntent, PlayerId, Role, RoomCode},
    error::ApiError,
    protocol::{
        BoardUpdate, ClientRequest, FieldRejection, ServerEvent, TrialEndReason, TrialStart,
    },
};
use tracing::{info, warn};

use crate::{
    config::ClientSettings,
    gate::{GateState, MoveRejection, MovementGate},
    render::{IncrementalRenderer, Repaint, Surface},
    view_store::ViewStore,
};

/// Who this client is. Supplied by the caller; never looked up from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub room_code: RoomCode,
    pub player_id: PlayerId,
    pub username: String,
}

impl SessionIdentity {
    pub fn new(room_code: &str, player_id: &str, username: &str) -> Self {
        let username = username.trim();
        Self {
            room_code: RoomCode::new(room_code),
            player_id: PlayerId::new(player_id),
            username: if username.is_empty() {
                "Player".to_string()
            } else {
                username.to_string()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialInfo {
    pub trial_index: u32,
    pub trials_total: Option<u32>,
    pub my_role: Role,
    pub deadline_ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    TrialStarted { trial: TrialInfo, view: BoardView },
    BoardChanged { view: BoardView, repaint: Repaint },
    GateChanged(GateState),
    IntentSent(MoveIntent),
    TrialEnded { trial_index: u32, reason: TrialEndReason },
    GameOver { results: serde_json::Value },
    ServerError(ApiError),
    Error(String),
}

pub struct GameSession<S> {
    identity: SessionIdentity,
    store: ViewStore,
    gate: MovementGate,
    renderer: IncrementalRenderer<S>,
    trial: Option<TrialInfo>,
}

impl<S: Surface> GameSession<S> {
    pub fn new(identity: SessionIdentity, settings: &ClientSettings) -> Self {
        Self {
            identity,
            store: ViewStore::new(),
            gate: MovementGate::new(settings.min_input_interval()),
            renderer: IncrementalRenderer::new(settings.palette, settings.cell_px),
            trial: None,
        }
    }

    pub fn with_surface(identity: SessionIdentity, settings: &ClientSettings, surface: S) -> Self {
        let mut session = Self::new(identity, settings);
        session.renderer.attach_surface(surface);
        session
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn snapshot(&self) -> Option<BoardView> {
        self.store.snapshot()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn trial(&self) -> Option<&TrialInfo> {
        self.trial.as_ref()
    }

    pub fn renderer(&self) -> &IncrementalRenderer<S> {
        &self.renderer
    }

    pub fn join_requests(&self) -> Vec<ClientRequest> {
        vec![
            ClientRequest::JoinGame {
                room_code: self.identity.room_code.clone(),
                player_id: self.identity.player_id.clone(),
                username: self.identity.username.clone(),
            },
            ClientRequest::RequestLiveState {
                room_code: self.identity.room_code.clone(),
            },
        ]
    }

    pub fn try_move(
        &mut self,
        direction: Direction,
        now: Instant,
    ) -> Result<ClientRequest, MoveRejection> {
        let view = self.store.snapshot();
        let intent = self.gate.try_move(view.as_ref(), direction.delta(), now)?;
        Ok(ClientRequest::Move {
            room_code: self.identity.room_code.clone(),
            player_id: self.identity.player_id.clone(),
            role: intent.role,
            delta: intent.delta,
        })
    }

    pub fn handle_server_event(&mut self, event: ServerEvent) -> Vec<ClientEvent> {
        match event {
            ServerEvent::TrialStart(start) => self.start_trial(&start),
            ServerEvent::BoardUpdate(update) => self.reconcile(&update),
            ServerEvent::TrialEnd {
                trial_index,
                reason,
            } => {
                info!(trial_index, ?reason, "trial ended");
                let mut events = vec![ClientEvent::TrialEnded {
                    trial_index,
                    reason,
                }];
                self.lock_terminal(&mut events);
                events
            }
            ServerEvent::GameOver { results } => {
                info!("game over");
                let mut events = vec![ClientEvent::GameOver { results }];
                self.lock_terminal(&mut events);
                events
            }
            ServerEvent::Error(err) => {
                warn!(code = ?err.code, message = %err.message, "authority rejected a request");
                vec![ClientEvent::ServerError(err)]
            }
        }
    }

    fn start_trial(&mut self, start: &TrialStart) -> Vec<ClientEvent> {
        let trial = match start.validate(&self.identity.player_id) {
            Ok(trial) => trial,
            Err(err) => {
                warn!(
                    trial_index = start.trial_index,
                    error = %err,
                    "ignoring unusable trial start; keeping previous state"
                );
                return vec![ClientEvent::Error(format!("invalid trial start: {err}"))];
            }
        };
        log_rejections(&trial.rejections);

        let view = trial.view;
        let info = TrialInfo {
            trial_index: trial.trial_index,
            trials_total: trial.trials_total,
            my_role: view.my_role,
            deadline_ts: trial.deadline_ts,
        };
        info!(
            trial_index = info.trial_index,
            my_role = %info.my_role,
            size = view.size,
            turn = %view.turn,
            "trial started"
        );

        self.store.replace(view.clone());
        self.renderer.draw_all(&view);
        let gate = self.gate.reset_for_trial(&view);
        self.trial = Some(info.clone());

        vec![
            ClientEvent::TrialStarted { trial: info, view },
            ClientEvent::GateChanged(gate),
        ]
    }

    fn reconcile(&mut self, update: &BoardUpdate) -> Vec<ClientEvent> {
        let Some(size) = self.store.snapshot().map(|view| view.size) else {
            warn!("board update before trial start; dropping");
            return Vec::new();
        };
        let validated = update.validate(size);
        log_rejections(&validated.rejections);

        let Some(outcome) = self.store.merge(&validated.patch) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        if outcome.changed() {
            let repaint = self.renderer.apply_delta(&outcome.previous, &outcome.current);
            events.push(ClientEvent::BoardChanged {
                view: outcome.current.clone(),
                repaint,
            });
        }

        let before = self.gate.state();
        let after = self.gate.observe_update(
            &outcome.current,
            validated.patch.turn.is_some(),
            validated.terminal,
        );
        if validated.terminal {
            info!(winner = ?validated.winner, "authority declared a winner");
        }
        if after != before {
            events.push(ClientEvent::GateChanged(after));
        }
        events
    }

    fn lock_terminal(&mut self, events: &mut Vec<ClientEvent>) {
        let before = self.gate.state();
        let after = self.gate.lock_terminal();
        if after != before {
            events.push(ClientEvent::GateChanged(after));
        }
    }
}

fn log_rejections(rejections: &[FieldRejection]) {
    for rejection in rejections {
        warn!(
            field = ?rejection.field,
            error = %rejection.error,
            "dropped malformed field from authority message"
        );
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
