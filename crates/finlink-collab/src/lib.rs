//! Interfaces the host tool-execution context must satisfy — cancellation
//! composition, the shared HTTP client factory, and the permission/clock
//! abstractions the artifact writer and provider adapters depend on.

pub mod cancel;
pub mod clock;
pub mod http;
pub mod permission;

pub use cancel::{compose, ComposedCancel};
pub use clock::{utc_safe_timestamp, Clock, FixedClock, SystemClock};
pub use http::{build_http_client, DEFAULT_HTTP_TIMEOUT};
pub use permission::{AlwaysAllow, AlwaysDeny, EditPermissionRequest, PermissionGate};
