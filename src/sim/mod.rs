pub mod event;
pub mod frame;
pub mod level;
pub mod step;
pub mod triggers;
pub mod world;
