use tracing::{debug, info, warn};

use crate::cache::{DirectorySource, FetchPolicy};
use crate::domain::role::UserType;
use crate::domain::snapshot::DirectorySnapshot;
use crate::errors::FetchError;
use crate::screen::engine::{ScreenEngine, ScreenTransitionError};
use crate::screen::states::{ScreenAction, ScreenEvent, ScreenState, SelectionState};
use crate::screen::view::{derive_view_model, ViewModel};

/// Identifies one issued fetch. Only the latest tag may change screen state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTag {
    pub sequence: u64,
    pub role: UserType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingFetch {
    pub tag: RequestTag,
    pub policy: FetchPolicy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchResolution {
    Applied,
    Discarded,
}

/// One customer screen instance: owns the selection, the current snapshot and
/// the screen state, and routes every fetch through its directory source.
pub struct CustomerScreen<S> {
    engine: ScreenEngine,
    source: S,
    default_role: UserType,
    state: ScreenState,
    selection: SelectionState,
    snapshot: Option<DirectorySnapshot>,
    last_error: Option<FetchError>,
    next_sequence: u64,
    in_flight: Option<RequestTag>,
}

impl<S> CustomerScreen<S>
where
    S: DirectorySource,
{
    pub fn new(source: S, default_role: UserType) -> Self {
        let engine = ScreenEngine;
        Self {
            state: engine.initial_state(),
            engine,
            source,
            default_role,
            selection: SelectionState::with_role(default_role),
            snapshot: None,
            last_error: None,
            next_sequence: 0,
            in_flight: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn snapshot(&self) -> Option<&DirectorySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn view_model(&self) -> ViewModel {
        derive_view_model(
            self.state,
            &self.selection,
            self.snapshot.as_ref(),
            self.last_error.as_ref().map(|error| error.message.as_str()),
        )
    }

    pub fn begin_mount(&mut self) -> Result<PendingFetch, ScreenTransitionError> {
        self.transition_to_fetch(ScreenEvent::Mount)
    }

    pub fn begin_role_change(
        &mut self,
        role: UserType,
    ) -> Result<PendingFetch, ScreenTransitionError> {
        self.transition_to_fetch(ScreenEvent::RoleSelected(role))
    }

    pub fn begin_refresh(&mut self) -> Result<PendingFetch, ScreenTransitionError> {
        self.transition_to_fetch(ScreenEvent::RefreshRequested)
    }

    /// Applies a fetch result if it belongs to the latest request, otherwise
    /// drops it without touching any state.
    pub fn complete_fetch(
        &mut self,
        tag: RequestTag,
        result: Result<DirectorySnapshot, FetchError>,
    ) -> FetchResolution {
        if self.in_flight != Some(tag) || tag.role != self.selection.role {
            debug!(
                event_name = "screen.fetch.discarded",
                role = tag.role.query_variable(),
                request_seq = tag.sequence,
                latest_seq = self.in_flight.map(|latest| latest.sequence),
                "discarding superseded directory response"
            );
            return FetchResolution::Discarded;
        }
        self.in_flight = None;

        let event = match &result {
            Ok(snapshot) => {
                info!(
                    event_name = "screen.fetch.succeeded",
                    role = tag.role.query_variable(),
                    request_seq = tag.sequence,
                    customers = snapshot.len(),
                    "directory snapshot applied"
                );
                ScreenEvent::FetchSucceeded
            }
            Err(error) => {
                warn!(
                    event_name = "screen.fetch.failed",
                    role = tag.role.query_variable(),
                    request_seq = tag.sequence,
                    error_kind = error.kind.as_str(),
                    error = %error,
                    "directory fetch failed"
                );
                ScreenEvent::FetchFailed
            }
        };

        match self.transition(event, Some(result)) {
            Ok(_) => FetchResolution::Applied,
            Err(error) => {
                warn!(
                    event_name = "screen.fetch.rejected",
                    request_seq = tag.sequence,
                    error = %error,
                    "fetch resolution rejected by screen state"
                );
                FetchResolution::Discarded
            }
        }
    }

    pub async fn run_fetch(&mut self, pending: PendingFetch) -> FetchResolution {
        let result = self.source.fetch(pending.tag.role, pending.policy).await;
        self.complete_fetch(pending.tag, result)
    }

    pub async fn mount(&mut self) -> Result<ViewModel, ScreenTransitionError> {
        let pending = self.begin_mount()?;
        self.run_fetch(pending).await;
        Ok(self.view_model())
    }

    pub async fn select_role(
        &mut self,
        role: UserType,
    ) -> Result<ViewModel, ScreenTransitionError> {
        let pending = self.begin_role_change(role)?;
        self.run_fetch(pending).await;
        Ok(self.view_model())
    }

    pub async fn refresh(&mut self) -> Result<ViewModel, ScreenTransitionError> {
        let pending = self.begin_refresh()?;
        self.run_fetch(pending).await;
        Ok(self.view_model())
    }

    /// Search edits never touch the state machine; they only re-derive the view.
    pub fn set_search_text(&mut self, text: impl Into<String>) -> ViewModel {
        self.selection.search_text = text.into();
        self.view_model()
    }

    pub fn unmount(&mut self) -> Result<(), ScreenTransitionError> {
        self.transition(ScreenEvent::Unmount, None).map(|_| ())
    }

    fn transition_to_fetch(
        &mut self,
        event: ScreenEvent,
    ) -> Result<PendingFetch, ScreenTransitionError> {
        self.transition(event, None)?
            .ok_or(ScreenTransitionError::InvalidTransition { state: self.state, event })
    }

    fn transition(
        &mut self,
        event: ScreenEvent,
        resolution: Option<Result<DirectorySnapshot, FetchError>>,
    ) -> Result<Option<PendingFetch>, ScreenTransitionError> {
        let outcome = self.engine.apply(self.state, event)?;
        if let ScreenEvent::RoleSelected(role) = event {
            self.selection.role = role;
        }

        let mut resolution = resolution;
        let mut pending = None;
        for action in &outcome.actions {
            match action {
                ScreenAction::IssueFetch(policy) => pending = Some(self.issue(*policy)),
                ScreenAction::StoreSnapshot => {
                    if let Some(Ok(snapshot)) = resolution.take() {
                        self.snapshot = Some(snapshot);
                        self.last_error = None;
                    }
                }
                ScreenAction::ClearSnapshot => self.snapshot = None,
                ScreenAction::ClearSearchText => self.selection.search_text.clear(),
                ScreenAction::RecordError => {
                    if let Some(Err(error)) = resolution.take() {
                        self.last_error = Some(error);
                    }
                }
                ScreenAction::ResetSelection => {
                    self.selection = SelectionState::with_role(self.default_role);
                    self.last_error = None;
                    self.in_flight = None;
                }
            }
        }

        debug!(
            event_name = "screen.transition",
            from = ?outcome.from,
            to = ?outcome.to,
            event = ?outcome.event,
            "screen transition applied"
        );
        self.state = outcome.to;
        Ok(pending)
    }

    fn issue(&mut self, policy: FetchPolicy) -> PendingFetch {
        self.next_sequence += 1;
        let tag = RequestTag { sequence: self.next_sequence, role: self.selection.role };
        self.in_flight = Some(tag);
        debug!(
            event_name = "screen.fetch.issued",
            role = tag.role.query_variable(),
            request_seq = tag.sequence,
            policy = ?policy,
            "directory fetch issued"
        );
        PendingFetch { tag, policy }
    }
}
