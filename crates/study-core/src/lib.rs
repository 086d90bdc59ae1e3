pub mod config;
pub mod device;
pub mod duration;
pub mod model;
pub mod progress;
pub mod state;
pub mod sync_loop;
pub mod target_store;

#[cfg(test)]
pub(crate) mod testing;
