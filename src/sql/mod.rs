pub mod builder;
pub mod quote;
pub mod statement;

pub use builder::{LabelExpr, Projection};
pub use quote::{qualified, quote_ident};
pub use statement::Statement;
