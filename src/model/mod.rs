pub mod collapse;
pub mod dependency;
pub mod drag;
pub mod geometry;
pub mod hierarchy;
pub mod layout;
pub mod mode;
pub mod pending;
pub mod reorder;
pub mod schedule;

pub use collapse::{CollapseKind, CollapseState};
pub use dependency::{DependencyEdge, DependencyGraph, EdgeRequestError, GraphStats, OrderingCheck};
pub use drag::{DragController, DropOutcome, Feedback, FeedbackTimings, RevertReason};
pub use geometry::{ColumnWidths, PixelRange, SlotGeometry};
pub use hierarchy::{DayIndex, EdgeId, GroupId, Hierarchy, LeafId, UnitId};
pub use layout::{Layout, LayoutMetrics};
pub use mode::{Mode, ModeController, NodeKind};
pub use pending::{OpId, OpStatus, PendingKind, PendingQueue};
pub use reorder::GroupOrder;
pub use schedule::{LoadedProject, OpResult, ProjectSpan, Schedule};
