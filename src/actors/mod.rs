//! Actor-based connectivity monitoring
//!
//! The monitor runs as an independent async task that owns all of its
//! state. The outside world talks to it through a [`monitor::MonitorHandle`]:
//!
//! ```text
//!   MonitorController ──spawn──► MonitorActor (tokio task)
//!          │                        │   │
//!          │ oneshot (shutdown)     │   └── EventSink (ping_status / login_status)
//!          └──────────────────────► │
//!          ◄─── watch (MonitorState)┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Shutdown**: a oneshot channel; sending or dropping it stops the loop
//! 2. **Events**: published through an [`EventSink`](crate::notify::EventSink), fire-and-forget
//! 3. **State**: the latest [`messages::MonitorState`] on a watch channel

pub mod messages;
pub mod monitor;
