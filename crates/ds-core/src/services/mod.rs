pub mod actions;
pub mod bulk;
pub mod config_loader;
pub mod differ;
pub mod docker_builder;
pub mod docker_image;
pub mod droplet_builder;
pub mod execution_metadata;
pub mod recipe_builder;
pub mod registry;
pub mod routes;
pub mod spec_store;
pub mod ssh;
