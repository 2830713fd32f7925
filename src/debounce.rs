use crate::events::GestureEvent;
use crate::labels::ExtensionTag;

/// One-shot extension trigger: the first INDEX/THUMB/HAND after a REST fires, repeats are
/// swallowed until the next REST.
#[derive(Debug, Default)]
pub struct ExtensionDebouncer {
    latched: bool,
}

impl ExtensionDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn on_tag(&mut self, tag: ExtensionTag) -> Option<GestureEvent> {
        if tag == ExtensionTag::Rest {
            let was = std::mem::replace(&mut self.latched, false);
            return was.then_some(GestureEvent::ExtensionReleased);
        }
        if self.latched {
            return None;
        }
        let class = tag.class()?;
        self.latched = true;
        Some(GestureEvent::Extension(class))
    }
}
