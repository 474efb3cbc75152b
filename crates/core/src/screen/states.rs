use serde::{Deserialize, Serialize};

use crate::cache::FetchPolicy;
use crate::domain::role::UserType;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenState {
    #[default]
    Idle,
    Loading,
    Ready,
    Refreshing,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenEvent {
    Mount,
    RoleSelected(UserType),
    RefreshRequested,
    FetchSucceeded,
    FetchFailed,
    Unmount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenAction {
    IssueFetch(FetchPolicy),
    StoreSnapshot,
    ClearSnapshot,
    ClearSearchText,
    RecordError,
    ResetSelection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub from: ScreenState,
    pub to: ScreenState,
    pub event: ScreenEvent,
    pub actions: Vec<ScreenAction>,
}

/// Transient user selection owned by one screen instance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub role: UserType,
    pub search_text: String,
}

impl SelectionState {
    pub fn with_role(role: UserType) -> Self {
        Self { role, search_text: String::new() }
    }
}
