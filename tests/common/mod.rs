pub mod builders;
pub mod test_db;

pub use builders::*;
pub use test_db::*;
