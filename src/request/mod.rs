//! Request-side types: raw parameters, the ordered parameter map, and the
//! filters-applied audit entries.

mod params;

pub use params::{AppliedFilter, RawParameter, SearchParams};
