pub mod forces;
pub mod steering;

pub use forces::ForceCalculator;
pub use steering::SteeringEngine;
