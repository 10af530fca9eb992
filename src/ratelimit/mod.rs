//! Rate limiting subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → middleware.rs (extract client identifier)
//!     → facade.rs (evaluate against the configured backend)
//!         → memory.rs (in-process fixed-window counters)
//!         → redis.rs  (shared counters for multi-process deployments)
//!     → Decision + X-RateLimit-* headers
//! ```
//!
//! # Design Decisions
//! - Fixed-window counting, not sliding-window: a burst straddling the
//!   window boundary can briefly exceed the quota. Known characteristic.
//! - The backend is chosen once at construction and never re-evaluated
//!   per request.
//! - Infrastructure faults fail **open**: enforcement degrades, traffic
//!   does not.

pub mod facade;
pub mod memory;
pub mod middleware;
pub mod policy;
pub mod redis;

pub use facade::RateLimiter;
pub use memory::MemoryCounterStore;
pub use policy::{Decision, RateLimitPolicy};
pub use redis::RedisCounterStore;
