pub mod consistency;
pub mod error;
pub mod types;
pub mod value;

pub use consistency::ConsistencyLevel;
pub use error::{ClusterError, Result};
pub use types::{DataType, Row, WriteType};
pub use value::Value;
