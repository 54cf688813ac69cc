mod cache;
mod growth;
mod mondrian_tree;
pub mod nodes;

pub use cache::{CacheKey, Mutation};
pub use mondrian_tree::{Membership, MondrianTree, suggested_life_time};
