pub mod address;
pub mod cell;
pub mod effect;
pub mod grid;
pub mod rules;
pub mod transform;
