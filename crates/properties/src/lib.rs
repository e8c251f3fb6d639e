//! Property Source
//!
//! String key/value configuration for the monitoring core, merged from a
//! snapshot of the process environment and an optional `.properties` file.
//!
//! - The file is located through the `monitoring.configuration` key (or the
//!   `MONITORING_CONFIGURATION` environment variable), defaulting to
//!   `monitoring.properties` in the working directory.
//! - When no file exists, bundled property text supplied by the embedding
//!   application is used instead.
//! - Loading never aborts startup: failures are logged and the source keeps
//!   only the environment snapshot.
//!
//! # Example
//!
//! ```rust
//! use properties::PropertySource;
//!
//! let props = PropertySource::builder()
//!     .path("does-not-exist.properties")
//!     .bundled("pool.size=4\n")
//!     .build();
//!
//! assert_eq!(props.get_int("pool.size", 1).unwrap(), 4);
//! assert_eq!(props.get("missing", "fallback"), "fallback");
//! ```

mod error;
pub mod parser;
mod source;

pub use error::{PropertyError, Result};
pub use source::{
    Builder, PropertySource, CONFIGURATION_ENV, CONFIGURATION_KEY, DEFAULT_CONFIGURATION_FILE,
    PREFIX,
};
