pub mod cache;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filters;
pub mod gateway;
pub mod screen;

pub use cache::{CacheSettings, CachedDirectory, DirectorySource, FetchPolicy};
pub use domain::{Customer, CustomerId, DirectorySnapshot, UserType};
pub use errors::{
    ApplicationError, DomainError, FetchError, FetchErrorKind, InterfaceError,
};
pub use filters::{filter_by_name, filter_by_role};
pub use gateway::{DirectoryGateway, LIST_CUSTOMERS_OPERATION};
pub use screen::{CustomerScreen, ScreenEngine, ScreenState, SelectionState, ViewModel};
