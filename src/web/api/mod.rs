pub mod elements;
pub mod error;
pub mod position;
pub mod predict;
