pub mod embedding_port;
pub mod document_backend;
