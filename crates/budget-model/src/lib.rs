pub mod budget_record;
pub mod record_key;
pub mod flatten;

pub use budget_record::*;
pub use record_key::*;
pub use flatten::*;
