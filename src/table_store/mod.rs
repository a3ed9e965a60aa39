mod schema;
mod store;

pub use store::{SqliteTableStore, TableName, TableSummary};
