//! Concrete completion providers

pub mod openai;
