pub mod duplicates;
pub mod extract;
pub mod model;
pub mod scoring;
pub mod session;
