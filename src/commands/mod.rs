pub mod complete;
pub mod dashboard;
pub mod hosts;
pub mod signal;
pub mod signals;
