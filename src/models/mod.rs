mod api;
mod query;

pub use api::{HealthResponse, ReadinessResponse, TokenPayload, TokenResponse};
pub use query::{EpochSeconds, RawSampleQuery, SampleQuery, SortOrder};
