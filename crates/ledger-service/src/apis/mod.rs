pub mod allowance;
pub mod authorization;
