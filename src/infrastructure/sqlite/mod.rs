pub mod backend;
pub mod migrations;
