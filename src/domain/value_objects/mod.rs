mod namespace;
mod object_key;

pub use namespace::Namespace;
pub use object_key::ObjectKey;
