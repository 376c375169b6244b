pub mod enrich;
pub mod merge;
pub mod normalize;
pub mod standardize;
pub mod validate;
