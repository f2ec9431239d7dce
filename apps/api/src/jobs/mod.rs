// Job postings: upload normalisation, persistence, routes.

pub mod handlers;
pub mod models;
pub mod repository;
