use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Inventory Value Objects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryPart {
    pub id: Uuid,
    pub name: String,
    pub serial_number: String,
    pub quantity_in_stock: u32,
    /// Reorder threshold, informational only
    pub min_quantity: u32,
    pub unit_price: Decimal,
}

impl InventoryPart {
    pub fn is_low_stock(&self) -> bool {
        self.quantity_in_stock <= self.min_quantity
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.serial_number.to_lowercase().contains(needle)
    }

    /// Case-insensitive match on name or serial number; an empty query matches everything
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty() || self.matches(&needle)
    }
}

#[derive(Debug, Clone)]
pub struct NewInventoryPart {
    pub name: String,
    pub serial_number: String,
    pub quantity_in_stock: u32,
    pub min_quantity: Option<u32>,
    pub unit_price: Decimal,
}

/// Catalog fields an administrator may edit. Stock is deliberately absent:
/// it only moves through reservations and `adjust_stock`.
#[derive(Debug, Clone)]
pub struct PartDetails {
    pub name: String,
    pub serial_number: String,
    pub unit_price: Decimal,
    pub min_quantity: Option<u32>,
}

/// Stock committed to an order. The unit price is captured when the stock is
/// taken so the order line keeps its cost if the catalog price changes later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub part_id: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl Reservation {
    pub fn line_cost(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> InventoryPart {
        InventoryPart {
            id: Uuid::new_v4(),
            name: "Oil filter".into(),
            serial_number: "OF-2231".into(),
            quantity_in_stock: 5,
            min_quantity: 5,
            unit_price: Decimal::new(4500, 2),
        }
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        let mut part = filter();
        assert!(part.is_low_stock());
        part.quantity_in_stock = 6;
        assert!(!part.is_low_stock());
    }

    #[test]
    fn test_search_matches_name_or_serial() {
        let part = filter();
        assert!(part.matches_search("oil"));
        assert!(part.matches_search("of-22"));
        assert!(part.matches_search("  "));
        assert!(!part.matches_search("brake"));
    }

    #[test]
    fn test_reservation_line_cost() {
        let reservation = Reservation {
            id: Uuid::new_v4(),
            part_id: Uuid::new_v4(),
            quantity: 3,
            unit_price: Decimal::new(1250, 2),
        };
        assert_eq!(reservation.line_cost(), Decimal::new(3750, 2));
    }
}
