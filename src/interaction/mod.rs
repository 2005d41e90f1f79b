//! Interaction pipeline: catalog, condition gate, dispatcher and result
//! processor.
//!
//! Every input surface funnels clicks through [`InteractionTrigger`]; the
//! dispatcher consults the gate and publishes the start event, and the
//! processor applies the configured effect and animates the displayed
//! values until the completion event fires.
pub mod catalog;
pub mod dispatcher;
pub mod events;
pub mod feedback;
pub mod gate;
pub mod plugin;
pub mod processor;
pub mod systems;
pub mod tween;
pub mod types;

pub use catalog::InteractionCatalog;
pub use dispatcher::{DispatchOutcome, InteractionDispatcher};
pub use gate::ConditionGate;
pub use plugin::InteractionPlugin;
pub use processor::ResultProcessor;
pub use systems::InteractionTrigger;
pub use types::TargetId;
