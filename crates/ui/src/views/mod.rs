mod home;
mod result;
mod state;
mod tryout;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use home::HomeView;
pub use result::{ResultTable, ResultView};
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use tryout::TryoutView;
