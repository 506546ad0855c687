//! Link and power state
use serde::Serialize;

use crate::info;

mod sm {
    use smlang::statemachine;

    statemachine! {
        transitions: {
            *Down + Open = Negotiating,
            Down + LinkUp = Up,
            Negotiating + LinkUp = Up,
            Negotiating + Close = Down,
            Up + LinkDown = Down,
            Up + Arm = MagicPacketWait,
            Up + Close = Down,
            MagicPacketWait + Close = Down,
        }
    }

    pub struct Context;

    impl StateMachineContext for Context {}
}

use sm::{Context, Events, StateMachine, States};

/// The state of the link as seen by the driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum LinkState {
    /// Closed, or the link was lost.
    Down,
    /// Opened and waiting for auto-negotiation to bring the link up.
    Negotiating,
    /// The MAC is configured for the negotiated mode and frames flow.
    Up,
    /// Receive-only, waiting for a magic packet.
    MagicPacketWait,
}

impl LinkState {
    fn from_state(state: &States) -> Self {
        match state {
            States::Down => LinkState::Down,
            States::Negotiating => LinkState::Negotiating,
            States::Up => LinkState::Up,
            States::MagicPacketWait => LinkState::MagicPacketWait,
        }
    }
}

pub(crate) struct Link {
    sm: StateMachine<Context>,
}

impl Link {
    pub fn new() -> Self {
        Self {
            sm: StateMachine::new(Context),
        }
    }

    pub fn state(&self) -> LinkState {
        LinkState::from_state(self.sm.state())
    }

    pub fn open(&mut self) {
        self.transition(Events::Open);
    }

    /// Returns true if the link came up from any other state.
    pub fn link_up(&mut self) -> bool {
        self.transition(Events::LinkUp)
    }

    pub fn link_down(&mut self) -> bool {
        self.transition(Events::LinkDown)
    }

    pub fn arm(&mut self) -> bool {
        self.transition(Events::Arm)
    }

    pub fn close(&mut self) {
        self.transition(Events::Close);
    }

    fn transition(&mut self, event: Events) -> bool {
        let previous = self.state();

        match self.sm.process_event(event) {
            Ok(state) => {
                info!("Link {:?} -> {:?}", previous, LinkState::from_state(state));
                true
            }
            // Events that do not apply to the current state are ignored.
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut link = Link::new();
        assert_eq!(link.state(), LinkState::Down);

        link.open();
        assert_eq!(link.state(), LinkState::Negotiating);

        // Arming needs an established link.
        assert!(!link.arm());
        assert!(!link.link_down());
        assert_eq!(link.state(), LinkState::Negotiating);

        assert!(link.link_up());
        assert!(!link.link_up());
        assert_eq!(link.state(), LinkState::Up);

        assert!(link.arm());
        assert_eq!(link.state(), LinkState::MagicPacketWait);

        // Only a close leaves magic packet mode.
        assert!(!link.link_down());
        assert!(!link.link_up());
        link.close();
        assert_eq!(link.state(), LinkState::Down);

        // Closing is idempotent.
        link.close();
        assert_eq!(link.state(), LinkState::Down);
    }

    #[test]
    fn renegotiation_after_loss() {
        let mut link = Link::new();
        link.open();
        link.link_up();

        assert!(link.link_down());
        assert_eq!(link.state(), LinkState::Down);

        assert!(link.link_up());
        assert_eq!(link.state(), LinkState::Up);
    }
}
