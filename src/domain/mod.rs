// Domain layer - Core types and planning rules

pub mod model;
pub mod rules;
