//! Switchboard Orchestrator
//!
//! Runs locked workflows: steps in order, fan-outs joined before the next
//! step, every failure typed.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Router                     │
//! │  - plan(request) via a Planner               │
//! │  - lock the definition against the registry  │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │                  Sequencer                   │
//! │  - renders payload templates                 │
//! │  - single / chained / fan-out steps          │
//! │  - emits ExecutionEvents                     │
//! └──────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │                TaskDispatcher                │
//! │  - resolve, send, extract                    │
//! └──────────────────────────────────────────────┘
//! ```

mod error;
mod events;
mod planner;
mod result;
mod router;
mod sequencer;

pub use error::{PlanError, RouteError, WorkflowError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use planner::{FixedPlanner, Planner};
pub use result::{Completion, StepOutput, WorkflowState};
pub use router::Router;
pub use sequencer::Sequencer;
