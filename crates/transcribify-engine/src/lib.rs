pub mod finders;
pub mod pipeline;

pub use finders::{ProviderFinder, StoreFinder};
pub use pipeline::ResolutionPipeline;
