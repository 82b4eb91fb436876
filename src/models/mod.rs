pub mod enums;
pub mod field;
pub mod row;

pub use enums::*;
pub use field::*;
pub use row::*;
