pub mod loader;
pub mod models;

pub use pokedex_catalog as catalog;
