//! Concrete search provider adapters.

pub mod brave_api;
pub mod duckduckgo;
pub mod instant_answer;
pub mod searxng;

pub use brave_api::BraveApiProvider;
pub use duckduckgo::DuckDuckGoHtmlProvider;
pub use instant_answer::InstantAnswerProvider;
pub use searxng::SearXngProvider;
