pub mod geo;
pub mod polar;
pub mod vec2d;
