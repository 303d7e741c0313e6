pub mod memory;
pub mod pool;
pub mod postgres;
pub mod seed;
pub mod store;
