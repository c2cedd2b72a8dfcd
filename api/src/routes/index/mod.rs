pub mod rebuild_index_route;
