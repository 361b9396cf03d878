// Submodules for separation of concerns
mod core;
mod criterion;
mod cursor;
mod eval;
mod filter;
mod order;
mod parse;
mod selector;
mod types;

pub use self::core::{Query, QuerySource};
pub use criterion::{Criterion, Plan};
pub use cursor::Cursor;
pub use filter::{HashFilter, Resolved, is_superset, resolve};
pub use order::RecordOrder;
pub use parse::{OrderEntrySerde, QuerySerde, parse_query_json, parse_selector_json};
pub use selector::Selector;
pub use types::{Direction, OPERATOR_PREFIX, Operator, SortSpec};
