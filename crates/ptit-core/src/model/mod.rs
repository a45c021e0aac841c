// ── Domain model ──
//
// Canonical record types for every managed list. Wire formats live in
// `ptit_api::types`; `crate::convert` bridges the two.

pub mod device;
pub mod device_type;
pub mod entity;
pub mod entity_id;
pub mod history;
pub mod notification;
pub mod user;

pub use device::{Device, DevicePatch, DeviceStatus, NewDevice};
pub use device_type::{DeviceType, DeviceTypePatch, NewDeviceType};
pub use entity::{Editable, Listable, Payload, Toggleable};
pub use entity_id::EntityId;
pub use history::HistoryEntry;
pub use notification::{NewNotification, Notification, NotificationLevel, NotificationPatch};
pub use user::{AccountStatus, NewUser, Role, User, UserPatch};
