pub mod collections;
pub mod delete_docs;
pub mod get_docs;
pub mod insert_docs;
pub mod retrieve;
pub mod update_docs;
pub mod wait;
