//! Request extractors: query parameters and JSON bodies, rejecting with `AppError`.

mod body;
mod query;

pub use body::JsonBody;
pub use query::QueryParams;
