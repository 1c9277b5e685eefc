// User-facing messages raised by the storage layer and the editor

pub mod notification;

pub use notification::{Notification, NotificationCategory, NotificationLevel};
