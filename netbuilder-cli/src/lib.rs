mod inspect;
mod plan;
mod render;
mod split;

pub use inspect::inspect;
pub use plan::run_plan;
pub use render::OutputFormat;
pub use split::split;
