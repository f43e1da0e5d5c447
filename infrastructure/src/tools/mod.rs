//! Tool schema conversion for the native tool-use APIs.

mod schema;

pub use schema::JsonSchemaToolConverter;
