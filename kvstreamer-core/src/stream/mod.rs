// Stream group
//
// Stream entries, the producer facade, the topic subscription registry and
// the controller that enables or disables the group as a unit.

pub mod controller;
pub mod entry;
pub mod local;
pub mod producer;
pub mod status;
pub mod subscription;

pub use controller::{ControllerSettings, StreamGroupController};
pub use entry::{InstallStatus, StreamEntry, TopicType};
pub use local::{LocalProducer, StreamStats};
pub use producer::{Frame, ProducerClient};
pub use status::LatchedStatus;
pub use subscription::{CallbackFactory, FrameHandler, ProducerFrameHandler, SubscriptionInstaller};
