pub mod challenge;
pub mod compiler;
pub mod config;
pub mod docs;
pub mod errors;
pub mod generator;
pub mod judge;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod verdict;
