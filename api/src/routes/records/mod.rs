pub mod record_route;
