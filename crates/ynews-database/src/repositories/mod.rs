//! Concrete repository implementations.

pub mod article;
