pub mod collection;
pub mod document;
pub mod stored_record;
