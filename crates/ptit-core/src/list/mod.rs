mod controller;
mod view;

pub use controller::{ListController, VisiblePage};
pub use view::{FilterValue, PageSize, ViewState};
