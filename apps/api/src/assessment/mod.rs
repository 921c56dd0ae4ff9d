// Assessment scoring & report synthesis engine.
// Pipeline: evaluator → penalty → aggregator → classifier → synthesizer, driven by controller.
// All LLM calls go through llm_client; no direct Anthropic calls here.

pub mod aggregator;
pub mod classifier;
pub mod competencies;
pub mod controller;
pub mod evaluator;
pub mod handlers;
pub mod models;
pub mod penalty;
pub mod prompts;
pub mod store;
pub mod synthesizer;

#[cfg(test)]
pub mod testing;
