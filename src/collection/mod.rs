//! Collection façade: a named view over an adapter with an optional transform.
mod core;
mod ops;

pub use self::core::Collection;
