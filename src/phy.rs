//! PHY management capability
use crate::negotiation::TechnologyAbility;

/// Access to the Ethernet PHY over its management interface.
///
/// # Note
/// Register access timing (MDIO clocking, turnaround) is left to the implementation.
pub trait Phy {
    /// Reset the PHY and wait for it to come back.
    ///
    /// # Returns
    /// False if the PHY did not respond or did not leave reset in time.
    fn reset(&mut self) -> bool;

    /// Advertise our abilities and restart auto-negotiation.
    ///
    /// # Args
    /// * `pause` - Specified true to advertise symmetric and asymmetric pause support.
    fn start_autonegotiate(&mut self, pause: bool);

    /// Read the local and link partner advertisements of the last completed negotiation.
    fn negotiation_result(&mut self) -> (TechnologyAbility, TechnologyAbility);

    /// Read the link status from the PHY itself.
    fn link_level(&mut self) -> bool;
}
