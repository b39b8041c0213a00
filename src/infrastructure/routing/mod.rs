//! Model routing infrastructure

mod router;

pub use router::{ModelRouter, RouterConfig};
