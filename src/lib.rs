//! Client for evaluating boolean feature flags against a remote evaluator.
//!
//! ```no_run
//! use feature_flag_client::{ClientOptions, EvaluationContext, FlagEvaluationClient, HttpEvaluator};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let evaluator = HttpEvaluator::new(
//!     "http://127.0.0.1:3000",
//!     "sdk_key",
//!     "production",
//!     EvaluationContext::default(),
//! )?;
//! let flags = FlagEvaluationClient::new(evaluator, ClientOptions::default());
//!
//! if flags.evaluate("featureNewUIComponents").await? {
//!     // new UI components
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod observability;

pub use client::{ClientOptions, FlagEvaluationClient, DEFAULT_TIMEOUT};
pub use config::Config;
pub use error::{ClientError, ConfigError, EvaluationError};
pub use evaluation::{EvaluationContext, FlagEvaluator, FlagName, HttpEvaluator, StaticEvaluator};
pub use observability::{FailureRecord, FailureSink, FallbackSource, RecordingSink, TracingSink};
