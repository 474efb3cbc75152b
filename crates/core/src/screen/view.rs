use serde::Serialize;

use crate::domain::customer::Customer;
use crate::domain::role::UserType;
use crate::domain::snapshot::DirectorySnapshot;
use crate::filters::{filter_by_name, filter_by_role};
use crate::screen::states::{ScreenState, SelectionState};

pub const DEFAULT_FETCH_ERROR_MESSAGE: &str = "Cannot fetch data from server";
pub const EMPTY_STATE_MESSAGE: &str = "No Customer Found";

/// Everything the presentation layer needs to render the customer screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub title: String,
    pub role: UserType,
    pub search_text: String,
    pub items: Vec<Customer>,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub error_message: Option<String>,
    pub is_empty: bool,
    pub show_search: bool,
    pub next_token: Option<String>,
}

/// Role filter, then text filter, then the flags derived from the screen state.
pub fn derive_view_model(
    state: ScreenState,
    selection: &SelectionState,
    snapshot: Option<&DirectorySnapshot>,
    last_error: Option<&str>,
) -> ViewModel {
    let is_loading = state == ScreenState::Loading;
    let is_refreshing = state == ScreenState::Refreshing;

    let error_message = (state == ScreenState::Error).then(|| match last_error {
        Some(message) if !message.trim().is_empty() => message.to_string(),
        _ => DEFAULT_FETCH_ERROR_MESSAGE.to_string(),
    });

    let visible = if is_loading { None } else { snapshot };
    let base = visible.map(|snapshot| filter_by_role(&snapshot.customers, selection.role));
    let base = base.unwrap_or_default();
    let items: Vec<Customer> =
        filter_by_name(&base, &selection.search_text).into_iter().cloned().collect();

    let is_empty = !is_loading && !is_refreshing && error_message.is_none() && items.is_empty();

    ViewModel {
        title: format!("{} Users", selection.role.label()),
        role: selection.role,
        search_text: selection.search_text.clone(),
        show_search: !base.is_empty(),
        items,
        is_loading,
        is_refreshing,
        error_message,
        is_empty,
        next_token: visible.and_then(|snapshot| snapshot.next_token.clone()),
    }
}
