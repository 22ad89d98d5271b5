pub mod config;
pub mod duration;
pub mod policy;
pub mod workload;
