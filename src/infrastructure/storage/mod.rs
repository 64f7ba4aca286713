//! Non-database dispenser storage

pub mod memory;

pub use memory::InMemoryDispenserRepository;
