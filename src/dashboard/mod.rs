//! Client-side dashboard core: fetches through the proxy, holds the current
//! state and derives view models from it.

pub mod client;
pub mod controller;
pub mod view;

pub use client::{DashboardClient, DashboardError};
pub use controller::{DashboardController, DashboardState, ForecastState};
pub use view::{ComparisonCard, DashboardView};
