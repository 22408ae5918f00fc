pub mod header;
pub mod name;

pub use header::{camel_case, clean_header, HeaderNormalizer};
pub use name::canonicalize;
