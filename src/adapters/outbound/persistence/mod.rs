mod object_store_document_repository;

pub use object_store_document_repository::{document_key, ObjectStoreDocumentRepository};
