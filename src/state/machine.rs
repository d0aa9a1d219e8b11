use std::collections::VecDeque;

use super::error::{StateError, StateResult};
use super::model::GENERATION_FAILED_MESSAGE;
use super::{event::StateTransition, AppEvent, AppPhase, Session};

/// Recent transitions kept for debugging; older entries fall off.
const TRANSITION_HISTORY_LIMIT: usize = 64;

#[derive(Debug)]
pub struct SessionMachine {
    session: Session,
    transition_history: VecDeque<StateTransition>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            session: Session::default(),
            transition_history: VecDeque::with_capacity(TRANSITION_HISTORY_LIMIT),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> AppPhase {
        self.session.phase()
    }

    pub fn can_transition(&self, event: &AppEvent) -> bool {
        next_session(&self.session, event.clone()).is_some()
    }

    pub fn transition(&mut self, event: AppEvent) -> StateResult<AppPhase> {
        let from = self.session.phase();
        let kind = event.kind();
        tracing::debug!(from = ?from, event = ?kind, "request state transition");

        let next = next_session(&self.session, event).ok_or_else(|| {
            tracing::warn!(from = ?from, event = ?kind, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event: kind }
        })?;

        let to = next.phase();
        self.session = next;
        if self.transition_history.len() == TRANSITION_HISTORY_LIMIT {
            self.transition_history.pop_front();
        }
        self.transition_history
            .push_back(StateTransition::new(from, kind, to));

        Ok(to)
    }
}

fn next_session(current: &Session, event: AppEvent) -> Option<Session> {
    match (current, event) {
        (Session::Idle, AppEvent::RequestCapture) => Some(Session::Capturing),
        (Session::Capturing, AppEvent::CancelCapture | AppEvent::CameraFailed) => {
            Some(Session::Idle)
        }
        (Session::Idle | Session::Capturing, AppEvent::Captured(original)) => {
            Some(Session::Processing { original })
        }
        (Session::Processing { original }, AppEvent::GenerationSucceeded(generated)) => {
            Some(Session::Result {
                original: original.clone(),
                generated,
            })
        }
        (Session::Processing { original }, AppEvent::GenerationFailed) => Some(Session::Error {
            original: original.clone(),
            message: GENERATION_FAILED_MESSAGE.to_string(),
        }),
        (_, AppEvent::Reset) => Some(Session::Idle),
        _ => None,
    }
}

#[cfg(test)]
impl SessionMachine {
    fn history(&self) -> Vec<StateTransition> {
        self.transition_history.iter().copied().collect()
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AppPhase::{:?}", self.session.phase())
    }
}
