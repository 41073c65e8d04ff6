//! Notifications from the viewer to its host

use std::cell::RefCell;
use std::rc::Rc;

use meshview_core::TopologyAttributes;
use meshview_io::LoadError;

/// Host callbacks
///
/// All methods default to doing nothing. `wants_topology` and
/// `wants_export` tell the viewer whether computing attributes on load or
/// re-encoding uncompressed sources is worth doing at all.
pub trait ViewerObserver {
    /// The first frame after a load is ready
    fn on_load(&mut self) {}

    fn on_topology(&mut self, _attributes: &TopologyAttributes) {}

    /// A load failed to decode
    fn on_error(&mut self, _error: &LoadError) {}

    /// zlib-deflated copy of an uncompressed source
    fn on_zip(&mut self, _buffer: Vec<u8>) {}

    fn wants_topology(&self) -> bool {
        false
    }

    fn wants_export(&self) -> bool {
        false
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ViewerObserver for NoopObserver {}

/// One recorded notification
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Load,
    Topology(TopologyAttributes),
    Error(String),
    Zip(Vec<u8>),
}

/// Observer that keeps every notification in a shared log
///
/// Clones share the log, so a host can hand one clone to the viewer and
/// read the other.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<ViewerEvent>>>,
    wants_topology: bool,
    wants_export: bool,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topology(mut self) -> Self {
        self.wants_topology = true;
        self
    }

    pub fn with_export(mut self) -> Self {
        self.wants_export = true;
        self
    }

    pub fn events(&self) -> Vec<ViewerEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, matches: impl Fn(&ViewerEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| matches(e)).count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: ViewerEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl ViewerObserver for EventRecorder {
    fn on_load(&mut self) {
        self.push(ViewerEvent::Load);
    }

    fn on_topology(&mut self, attributes: &TopologyAttributes) {
        self.push(ViewerEvent::Topology(*attributes));
    }

    fn on_error(&mut self, error: &LoadError) {
        self.push(ViewerEvent::Error(error.to_string()));
    }

    fn on_zip(&mut self, buffer: Vec<u8>) {
        self.push(ViewerEvent::Zip(buffer));
    }

    fn wants_topology(&self) -> bool {
        self.wants_topology
    }

    fn wants_export(&self) -> bool {
        self.wants_export
    }
}
