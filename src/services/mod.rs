pub mod providers;
pub mod recommendations;
pub mod resolution;

pub use providers::{MetadataProvider, TmdbProvider};
pub use recommendations::Engine;
pub use resolution::ResolutionCache;
