pub mod admin_routes;
pub mod application_routes;
pub mod editing_routes;
pub mod health;
