mod region;
mod statistics;

pub use region::Region;
pub use statistics::LabelSummary;
