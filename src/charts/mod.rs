pub(crate) mod dataset;
pub(crate) mod formatter;

pub use dataset::Dataset;
