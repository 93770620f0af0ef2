pub mod argument;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod expression;
pub mod lexer;
pub mod policy;
pub mod section;
pub mod value;

pub use argument::{Argument, ArgumentList};
pub use config::Config;
pub use error::{DiffError, ParseError};
pub use expression::{COMMENT_ID_KEY, Expression};
pub use lexer::{Lexer, extract_find_group};
pub use policy::Policy;
pub use section::Section;
pub use value::{Value, quote};
