//! Admin area: section management flow and dashboard statistics.

pub mod manager;
pub mod stats;

pub use manager::{EditorTarget, ListState, SectionForm, SectionsManager};
pub use stats::{DashboardStats, SectionShare};
