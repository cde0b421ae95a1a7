pub mod download;
pub mod pages;

pub use download::download;
pub use pages::{home, secrets};
