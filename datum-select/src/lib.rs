//! Headless dropdown selection for `datum` forms.
//!
//! [`Select`] keeps its selection in a form field and only tracks view state
//! itself: whether the option list is open, the filter text, and the hovered
//! option. Rendering and input handling are left to the caller.

mod filter;
mod select;

pub use filter::filter_labels;
pub use select::{CreateFn, FocusFn, LabelFn, Select, SelectId, SelectOptions};
