pub mod assignments;
pub mod core;
pub mod session;
pub mod submissions;
pub mod views;
