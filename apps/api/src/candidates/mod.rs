// Candidates: resume processing pipeline, record building, persistence, routes.

pub mod handlers;
pub mod pipeline;
pub mod record;
pub mod repository;
