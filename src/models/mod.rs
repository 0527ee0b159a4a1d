pub mod document_request;

pub use document_request::*;
