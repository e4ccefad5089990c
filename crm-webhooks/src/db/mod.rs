mod sqlite;
mod tables;

pub use sqlite::Database;
pub use tables::dashboard::DEFAULT_TOP_CONTACTS_LIMIT;
