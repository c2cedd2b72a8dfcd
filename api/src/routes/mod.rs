pub mod index;
pub mod records;
pub mod root_route;
pub mod search;
pub mod stats_route;
