//! Person persistence expressed as batched graph statements.

pub mod error;
pub mod model;
pub mod service;
pub mod statement;

pub use error::{PeopleError, PeopleResult};
pub use model::{Identifier, Person, FACTSET_AUTHORITY, TME_AUTHORITY};
pub use service::{write_statements, PeopleService, StatementRunner};
pub use statement::{ResultSlot, Statement, StatementOutput, UpdateStats};
