//! Wire codec: name compression, header/question/RR layout, and the fixed
//! TYPE/CLASS tables this resolver understands.
pub mod message;
pub mod name;
pub mod types;

pub use message::{build_query, build_query_with_id, parse_response, AnswerRecord, ParsedResponse};
pub use name::{decode_name, encode_name, skip_rr};
pub use types::{QClass, QType, ResponseCode};
