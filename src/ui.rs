use std::sync::Arc;
use std::time::Duration;

use log::info;
use parking_lot::RwLock;

use crate::items::KindFlags;

/// HUD collaborator: transient messages plus inventory, deposit and counter panels.
pub trait UiSink: Send + Sync {
    fn show_message(&self, text: &str, duration: Duration);
    fn update_inventory(&self, held: KindFlags);
    fn update_deposits(&self, deposited: KindFlags);
    fn update_craft_counter(&self, count: u32);
}

impl<T> UiSink for Arc<T>
where
    T: UiSink + ?Sized,
{
    fn show_message(&self, text: &str, duration: Duration) {
        (**self).show_message(text, duration)
    }

    fn update_inventory(&self, held: KindFlags) {
        (**self).update_inventory(held)
    }

    fn update_deposits(&self, deposited: KindFlags) {
        (**self).update_deposits(deposited)
    }

    fn update_craft_counter(&self, count: u32) {
        (**self).update_craft_counter(count)
    }
}

/// Last state pushed to each HUD panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudSnapshot {
    pub messages: Vec<String>,
    pub held: KindFlags,
    pub deposited: KindFlags,
    pub craft_count: u32,
}

/// Headless HUD that logs and records everything it is asked to show.
#[derive(Debug, Default)]
pub struct MessageLog {
    state: Arc<RwLock<HudSnapshot>>,
}

impl Clone for MessageLog {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HudSnapshot {
        self.state.read().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.state.read().messages.clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.state.read().messages.last().cloned()
    }

    /// Returns true if any recorded message contains `needle`.
    pub fn saw(&self, needle: &str) -> bool {
        self.state
            .read()
            .messages
            .iter()
            .any(|message| message.contains(needle))
    }
}

impl UiSink for MessageLog {
    fn show_message(&self, text: &str, _duration: Duration) {
        info!("message: {text}");
        self.state.write().messages.push(text.to_string());
    }

    fn update_inventory(&self, held: KindFlags) {
        self.state.write().held = held;
    }

    fn update_deposits(&self, deposited: KindFlags) {
        self.state.write().deposited = deposited;
    }

    fn update_craft_counter(&self, count: u32) {
        self.state.write().craft_count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemKind;

    #[test]
    fn clones_share_history() {
        let log = MessageLog::new();
        let shared = log.clone();
        shared.show_message("Filter picked up!", Duration::from_secs(3));
        assert!(log.saw("Filter"));
        assert_eq!(log.last_message().as_deref(), Some("Filter picked up!"));
    }

    #[test]
    fn panels_keep_latest_state() {
        let log = MessageLog::new();
        let mut held = KindFlags::default();
        held.set(ItemKind::Paper, true);
        log.update_inventory(held);
        log.update_craft_counter(2);
        let snapshot = log.snapshot();
        assert!(snapshot.held.get(ItemKind::Paper));
        assert_eq!(snapshot.craft_count, 2);
    }
}
