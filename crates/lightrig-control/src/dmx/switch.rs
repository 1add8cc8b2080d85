//! Routes writes to one backing controller per universe.

use std::collections::BTreeMap;
use std::fmt;

use lightrig_core::{DmxController, Universe};
use tracing::{debug, warn};

/// Which transport backs a universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// ENTTEC DMX USB Pro
    Enttec,
    /// Art-Net node
    ArtNet,
    /// In-memory
    Mock,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enttec => write!(f, "ENTTEC Pro"),
            Self::ArtNet => write!(f, "Art-Net"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

struct Route {
    kind: TransportKind,
    controller: Box<dyn DmxController>,
}

/// Fans writes out by universe tag and flushes every controller on submit.
#[derive(Default)]
pub struct SwitchController {
    routes: BTreeMap<Universe, Route>,
}

impl SwitchController {
    /// A switch with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `universe` to `controller`, replacing any previous route.
    pub fn add(&mut self, universe: Universe, kind: TransportKind, controller: Box<dyn DmxController>) {
        debug!("Routing universe {} to {}", universe, kind);
        self.routes.insert(universe, Route { kind, controller });
    }

    /// Transport behind `universe`.
    pub fn kind(&self, universe: Universe) -> Option<TransportKind> {
        self.routes.get(&universe).map(|r| r.kind)
    }

    /// Every routed universe and its transport.
    pub fn routes(&self) -> impl Iterator<Item = (Universe, TransportKind)> + '_ {
        self.routes.iter().map(|(u, r)| (*u, r.kind))
    }
}

impl DmxController for SwitchController {
    fn set_channel(&mut self, channel: u16, value: u8, universe: Universe) {
        match self.routes.get_mut(&universe) {
            Some(route) => route.controller.set_channel(channel, value, universe),
            None => debug!("No transport for universe {}", universe),
        }
    }

    /// Flushes every controller even when one fails; the first error is
    /// returned.
    fn submit(&mut self) -> lightrig_core::Result<()> {
        let mut first_error = None;
        for (universe, route) in self.routes.iter_mut() {
            if let Err(e) = route.controller.submit() {
                warn!("Submit on universe {} ({}) failed: {}", universe, route.kind, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightrig_core::CoreError;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Failing(Rc<RefCell<usize>>);

    impl DmxController for Failing {
        fn set_channel(&mut self, _channel: u16, _value: u8, _universe: Universe) {}

        fn submit(&mut self) -> lightrig_core::Result<()> {
            *self.0.borrow_mut() += 1;
            Err(CoreError::Transport("unplugged".to_string()))
        }
    }

    struct Counting(Rc<RefCell<usize>>);

    impl DmxController for Counting {
        fn set_channel(&mut self, _channel: u16, _value: u8, _universe: Universe) {}

        fn submit(&mut self) -> lightrig_core::Result<()> {
            *self.0.borrow_mut() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_submit_reaches_every_controller() {
        let failed = Rc::new(RefCell::new(0));
        let counted = Rc::new(RefCell::new(0));
        let mut switch = SwitchController::new();
        switch.add(Universe::Default, TransportKind::Enttec, Box::new(Failing(failed.clone())));
        switch.add(Universe::ART1, TransportKind::ArtNet, Box::new(Counting(counted.clone())));

        assert!(switch.submit().is_err());
        assert_eq!(*failed.borrow(), 1);
        assert_eq!(*counted.borrow(), 1);
    }

    #[test]
    fn test_unrouted_universe_is_dropped() {
        let mut switch = SwitchController::new();
        switch.set_channel(1, 255, Universe::ArtNet(9));
        assert!(switch.submit().is_ok());
        assert_eq!(switch.kind(Universe::ArtNet(9)), None);
    }
}
