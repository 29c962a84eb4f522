pub mod chain;
pub mod index;
pub mod read_block;
pub mod tools;
pub mod tx;
