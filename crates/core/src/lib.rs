pub mod capture;
pub mod config;
pub mod detection;
pub mod imaging;
pub mod pipeline;
pub mod ranging;
pub mod shared;
