//! The pack/unpack workflow around the schematic engine.
//!
//! Hosts hand each interaction its world, actor, claim check, feedback sink
//! and vitals explicitly; the [`SchematicTool`] keeps only configuration and
//! the highlight timer between calls.

pub mod error;
pub mod feedback;
pub mod host;
pub mod policy;
pub mod tool;
pub mod validation;

pub use error::{ColorError, WorkflowError};
pub use feedback::{FeedbackSink, HighlightColor, HighlightScheduler, LogFeedback, Notice};
pub use host::{ActorVitals, HostProbe, NoVitals, PositionStrategy, reduce_only_saturation};
pub use policy::{ActorId, AllowAll, MaterialPolicy, PermissionValidator};
pub use tool::{Interaction, PackOutcome, SchematicTool};
pub use validation::{ValidationReport, Violation, ViolationKind};
