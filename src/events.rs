pub mod bus;
pub mod payloads;

pub use bus::{DeliveryPolicy, Envelope, EventBus, EventHandler, Topic};
pub use payloads::{
    AgentTaskCompleted, AgentTaskCreated, DataProcessed, DataUploaded, Notification,
    NotificationKind,
};
