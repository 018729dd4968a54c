mod config_ort;
mod filesystem_access;
mod time_calc;

pub use config_ort::ConfigOrt;

pub use crate::detection_runners::ort_detector::input_wrapper::{X, Xs};
pub use crate::detection_runners::ort_detector::y::Y;

pub use filesystem_access::FsAccess;
pub use time_calc::TimeCalc;

pub(crate) const CROSS_MARK: &str = "❌";
