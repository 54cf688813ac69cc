mod fixtures;

pub use fixtures::point_cloud::unit_cube_points;
pub use fixtures::standard_setup::StandardSetup;
