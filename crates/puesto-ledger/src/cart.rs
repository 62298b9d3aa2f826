//! # Cart Value Object
//!
//! The session cart a cashier builds before confirming a sale. Owned by the
//! presentation layer: an explicit, serializable value the UI can persist
//! between screens and replay into `process_sale` line by line.
//!
//! The ledger never consults the cart. Prices are frozen when a line is
//! added; stock is only checked when the sale actually runs.

use serde::{Deserialize, Serialize};

use crate::catalog::FlavorSnapshot;

/// One line in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub flavor_id: String,

    /// Flavor name at time of adding (frozen).
    pub name: String,

    /// Emoji for display.
    pub emoji: String,

    /// Unit price at time of adding (frozen).
    pub unit_price_cents: i64,

    pub quantity: i64,
}

impl CartLine {
    /// Line total: unit price x quantity.
    pub fn total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

/// The cashier's in-progress cart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds units of a flavor, merging into an existing line.
    pub fn add(&mut self, snapshot: &FlavorSnapshot, unit_price_cents: i64, quantity: i64) {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.flavor_id == snapshot.flavor.id)
        {
            line.quantity += quantity;
            return;
        }

        self.lines.push(CartLine {
            flavor_id: snapshot.flavor.id.clone(),
            name: snapshot.flavor.name.clone(),
            emoji: snapshot.flavor.emoji.clone(),
            unit_price_cents,
            quantity,
        });
    }

    /// Sets a line's quantity; zero or less removes the line.
    pub fn set_quantity(&mut self, flavor_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove(flavor_id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.flavor_id == flavor_id) {
            line.quantity = quantity;
        }
    }

    /// Removes a line.
    pub fn remove(&mut self, flavor_id: &str) {
        self.lines.retain(|l| l.flavor_id != flavor_id);
    }

    /// Empties the cart (after a confirmed sale).
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn total_units(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Cart total in cents.
    pub fn total_cents(&self) -> i64 {
        self.lines.iter().map(CartLine::total_cents).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
