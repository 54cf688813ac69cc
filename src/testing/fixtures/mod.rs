pub mod point_cloud;
pub mod standard_setup;
