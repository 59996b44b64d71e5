pub mod serializer;
pub use serializer::{Param, Params, Placeholder, Serializer};

pub mod stmt;
pub use stmt::Statement;
