pub mod document;
pub mod error;
pub mod exit_code;
pub mod identity;
pub mod instruction;
pub mod normalize;
pub mod parser;
pub mod source;
pub mod value;

pub use crate::document::Document;
pub use crate::error::Error;
pub use crate::exit_code::ExitCode;
pub use crate::identity::{RandomStageIdentity, StageIdentity};
pub use crate::instruction::{Instruction, Keyword};
pub use crate::normalize::{DefaultNormalizer, Normalizer};
pub use crate::parser::{ParseOptions, Parser, parse_dockerfile, parse_file};
pub use crate::value::{Map, Value};
