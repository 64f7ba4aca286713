//! Database repository implementations

pub mod dispenser_repository;

pub use dispenser_repository::SeaOrmDispenserRepository;
