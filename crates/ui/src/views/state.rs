use dioxus::prelude::*;
use services::TryoutError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    Unknown,
    NotFound,
    EmptyPackage,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Unknown => "Something went wrong. Please try again.",
            Self::NotFound => "Not found.",
            Self::EmptyPackage => "This package has no questions yet.",
        }
    }
}

impl From<&TryoutError> for ViewError {
    fn from(err: &TryoutError) -> Self {
        match err {
            TryoutError::Empty => Self::EmptyPackage,
            err if err.is_not_found() => Self::NotFound,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: &Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
