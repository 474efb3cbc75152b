use thiserror::Error;

use crate::cache::FetchPolicy;
use crate::screen::states::{ScreenAction, ScreenEvent, ScreenState, TransitionOutcome};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScreenTransitionError {
    #[error("invalid screen transition from {state:?} using event {event:?}")]
    InvalidTransition { state: ScreenState, event: ScreenEvent },
}

/// Transition table of the customer screen.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScreenEngine;

impl ScreenEngine {
    pub fn initial_state(&self) -> ScreenState {
        ScreenState::Idle
    }

    pub fn apply(
        &self,
        current: ScreenState,
        event: ScreenEvent,
    ) -> Result<TransitionOutcome, ScreenTransitionError> {
        use ScreenAction::{
            ClearSearchText, ClearSnapshot, IssueFetch, RecordError, ResetSelection, StoreSnapshot,
        };
        use ScreenEvent::{
            FetchFailed, FetchSucceeded, Mount, RefreshRequested, RoleSelected, Unmount,
        };
        use ScreenState::{Error, Idle, Loading, Ready, Refreshing};

        let (to, actions) = match (current, event) {
            (Idle, Mount) => (Loading, vec![IssueFetch(FetchPolicy::CacheFirst)]),
            (_, RoleSelected(_)) => {
                (Loading, vec![ClearSearchText, IssueFetch(FetchPolicy::CacheFirst)])
            }
            (Ready | Error, RefreshRequested) => {
                (Refreshing, vec![IssueFetch(FetchPolicy::NetworkOnly)])
            }
            (Loading | Refreshing, FetchSucceeded) => (Ready, vec![StoreSnapshot]),
            (Loading | Refreshing, FetchFailed) => (Error, vec![ClearSnapshot, RecordError]),
            (Loading | Ready | Refreshing | Error, Unmount) => {
                (Idle, vec![ResetSelection, ClearSnapshot])
            }
            (state, event) => {
                return Err(ScreenTransitionError::InvalidTransition { state, event });
            }
        };

        Ok(TransitionOutcome { from: current, to, event, actions })
    }
}
