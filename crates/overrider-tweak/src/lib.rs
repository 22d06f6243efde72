//! The "override pure virtual methods" refactoring.
//!
//! # Pipeline
//!
//! ```text
//! Selection ─▶ collect (bases, depth-first) ─▶ reconcile (override ids) ─▶ emit (text + anchor) ─▶ Effect
//! ```
//!
//! Every stage only reads the [`SemanticModel`](overrider_model::SemanticModel);
//! the caller decides whether to apply the returned [`Effect`].

mod collect;
mod reconcile;
mod emit;
mod edit;
mod selection;
mod tweak;
mod override_pure_virtuals;

pub use collect::collect_abstract_methods;
pub use reconcile::{reconcile, ResidualSet};
pub use emit::{choose_anchor, emit, render_method, EmitPolicy, InsertionAnchor, PublicSection, StubStyle};
pub use edit::{Effect, TextEdit};
pub use selection::{SelectedNode, Selection};
pub use tweak::{Tweak, TweakRegistry};
pub use override_pure_virtuals::OverridePureVirtuals;
