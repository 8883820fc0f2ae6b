pub mod chunk;
pub mod config;
pub mod context;
pub mod helpers;
pub mod logging;
pub mod params;
pub mod registry;
pub mod template;
pub mod value;

pub use chunk::Chunk;
pub use config::Config;
pub use context::Context;
pub use helpers::register_helpers;
pub use logging::{Level, Logger, MemorySink};
pub use params::{Param, Params};
pub use registry::{Comparator, Helper, Registry};
pub use template::{Bodies, Body, Template};
