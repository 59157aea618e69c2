//! Model layers built on a [`Theta`](crate::theta::Theta)

pub mod token_embedding;

pub use token_embedding::TokenEmbedding;
