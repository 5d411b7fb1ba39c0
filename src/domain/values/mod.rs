pub mod document_field;
pub mod document_id;
pub mod similarity;
