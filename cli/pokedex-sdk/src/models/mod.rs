pub mod entry;
pub mod evolution;
pub mod filter;
pub mod index;
pub mod moves;
pub mod species_info;
pub mod type_chart;
