//! Event bus module: typed and string-keyed publish/subscribe with snapshot
//! delivery, per-handler failure isolation and a bounded publish history.
pub mod channel;
pub mod history;
pub mod inbox;
pub mod plugin;

pub use channel::{event_name, EventBus, HandlerResult, PublishReport, SubscriptionHandle};
pub use inbox::BusInbox;
pub use plugin::BusPlugin;
