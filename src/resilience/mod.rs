//! 弹性模式模块：重试与指数退避。
//!
//! # Resilience Module
//!
//! Every retried capability runs its transport attempts through a single
//! [`retry::RetryPolicy`]: up to `max_attempts` tries, exponential backoff of
//! `unit * 2^k` after the k-th failure, and a terminal
//! [`crate::Error::RetriesExhausted`] once the budget is spent.
//!
//! ```rust
//! use multi_capabilities::resilience::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(8, Duration::from_secs(1));
//! assert_eq!(policy.delay_for(0), Duration::from_secs(1));
//! assert_eq!(policy.delay_for(7), Duration::from_secs(128));
//! assert_eq!(policy.total_backoff(), Duration::from_secs(255));
//! ```

pub mod retry;

pub use retry::RetryPolicy;
