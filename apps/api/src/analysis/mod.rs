// Resume analysis: prompt construction, completion call, tolerant JSON recovery.
// All completion calls go through llm_client.

pub mod models;
pub mod prompts;
pub mod repair;
pub mod scorer;
