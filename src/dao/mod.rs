//! Data access for `Person` records.

mod error;
mod person;
mod store;

pub use error::{DaoError, DaoResult};
pub use person::Person;
pub use store::{PersonDao, PersonStore};
