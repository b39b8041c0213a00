//! Infrastructure services

mod serving_service;

pub use serving_service::{
    ResponseSource, ServeOutcome, ServeRequest, ServingService, build_prompt,
};
