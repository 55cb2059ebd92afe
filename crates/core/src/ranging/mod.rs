pub mod distance_estimator;
pub mod domain;
