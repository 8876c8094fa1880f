//! Static coaching data: the persona profile and daily metrics time series

pub mod store;
pub mod types;

pub use store::{DataError, MetricStore};
pub use types::{Baselines, DailyMetric, PersonaProfile, UserData};
