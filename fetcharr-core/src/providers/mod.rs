//! §4.D provider registry and orchestrator.

mod fanart;
mod orchestrator;
mod registry;
mod tmdb;

pub use fanart::FanartTvAdapter;
pub use orchestrator::{OrchestrationStrategy, Orchestrator, OrchestrationResult};
pub use registry::ProviderRegistry;
pub use tmdb::TmdbAdapter;
