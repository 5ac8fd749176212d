pub mod monte_carlo;
pub mod phases;
pub mod planning;
