// ============================================================================
// Messaging - outbound customer notifications
// ============================================================================

mod dispatcher;
mod notification;
mod notifier;

pub use dispatcher::{EffectDispatcher, NotificationDispatcher};
pub use notification::Notification;
pub use notifier::{LogNotifier, Notifier, NotifierError};

#[cfg(test)]
pub use notifier::testing;
