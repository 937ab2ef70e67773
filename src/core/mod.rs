pub mod error;
pub mod types;
pub mod value;

pub use error::{AdminError, AdminResult};
pub use types::{ColumnType, NormalizedType, WriteClass, convert_for_write, normalize};
pub use value::Value;
