pub mod rank;
pub mod render;
