//! Application services

mod dispenser;
mod locks;

pub use dispenser::DispenserService;
pub use locks::DispenserLocks;
