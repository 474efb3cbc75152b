pub mod controller;
pub mod engine;
pub mod states;
pub mod view;

pub use controller::{CustomerScreen, FetchResolution, PendingFetch, RequestTag};
pub use engine::{ScreenEngine, ScreenTransitionError};
pub use states::{ScreenAction, ScreenEvent, ScreenState, SelectionState, TransitionOutcome};
pub use view::{derive_view_model, ViewModel, DEFAULT_FETCH_ERROR_MESSAGE, EMPTY_STATE_MESSAGE};
