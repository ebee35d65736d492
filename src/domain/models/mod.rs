pub mod asset;
pub mod derivative;
pub mod document;
pub mod record;
pub mod upload;

pub use asset::*;
pub use derivative::*;
pub use document::*;
pub use record::*;
pub use upload::*;
