pub mod catalog;
pub mod debounce;
pub mod error;
pub mod pair;
pub mod sequencer;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
