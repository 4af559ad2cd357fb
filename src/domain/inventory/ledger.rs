use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::EngineError;
use crate::metrics::Metrics;
use crate::utils::lock_entity;
use super::errors::InventoryError;
use super::value_objects::{InventoryPart, NewInventoryPart, PartDetails, Reservation};

// ============================================================================
// Inventory Ledger
// ============================================================================
//
// Owns stock quantities. Each part sits behind its own lock, so the
// availability check and the decrement in `reserve` happen as one step and
// two concurrent reservations can never both see the same units.
//
// Conservation: quantity_in_stock + reserved is only changed by
// `adjust_stock` (and by registration).
//
// ============================================================================

struct PartSlot {
    part: InventoryPart,
    /// Sum of live reservation quantities against this part
    reserved: u32,
    removed: bool,
}

pub struct InventoryLedger {
    parts: DashMap<Uuid, Arc<Mutex<PartSlot>>>,
    lock_timeout: Duration,
    default_min_quantity: u32,
    metrics: Arc<Metrics>,
}

impl InventoryLedger {
    pub fn new(lock_timeout: Duration, default_min_quantity: u32, metrics: Arc<Metrics>) -> Self {
        Self {
            parts: DashMap::new(),
            lock_timeout,
            default_min_quantity,
            metrics,
        }
    }

    fn slot(&self, part_id: Uuid) -> Result<Arc<Mutex<PartSlot>>, InventoryError> {
        self.parts
            .get(&part_id)
            .map(|entry| entry.value().clone())
            .ok_or(InventoryError::PartNotFound(part_id))
    }

    fn validate_price(price: Decimal) -> Result<(), InventoryError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(InventoryError::InvalidPrice(price));
        }
        Ok(())
    }

    pub async fn register_part(&self, new_part: NewInventoryPart) -> Result<InventoryPart, EngineError> {
        if new_part.name.trim().is_empty() {
            return Err(InventoryError::EmptyName.into());
        }
        Self::validate_price(new_part.unit_price)?;

        let part = InventoryPart {
            id: Uuid::new_v4(),
            name: new_part.name,
            serial_number: new_part.serial_number,
            quantity_in_stock: new_part.quantity_in_stock,
            min_quantity: new_part.min_quantity.unwrap_or(self.default_min_quantity),
            unit_price: new_part.unit_price,
        };

        self.parts.insert(
            part.id,
            Arc::new(Mutex::new(PartSlot { part: part.clone(), reserved: 0, removed: false })),
        );

        tracing::info!(
            part_id = %part.id,
            name = %part.name,
            quantity_in_stock = part.quantity_in_stock,
            "Registered inventory part"
        );

        Ok(part)
    }

    pub async fn get_part(&self, part_id: Uuid) -> Result<InventoryPart, EngineError> {
        let slot = self.slot(part_id)?;
        let slot = lock_entity(&slot, "part", part_id, self.lock_timeout, &self.metrics).await?;
        if slot.removed {
            return Err(InventoryError::PartNotFound(part_id).into());
        }
        Ok(slot.part.clone())
    }

    pub async fn update_part_details(
        &self,
        part_id: Uuid,
        details: PartDetails,
    ) -> Result<InventoryPart, EngineError> {
        if details.name.trim().is_empty() {
            return Err(InventoryError::EmptyName.into());
        }
        Self::validate_price(details.unit_price)?;

        let slot = self.slot(part_id)?;
        let mut slot = lock_entity(&slot, "part", part_id, self.lock_timeout, &self.metrics).await?;
        if slot.removed {
            return Err(InventoryError::PartNotFound(part_id).into());
        }

        slot.part.name = details.name;
        slot.part.serial_number = details.serial_number;
        slot.part.unit_price = details.unit_price;
        if let Some(min_quantity) = details.min_quantity {
            slot.part.min_quantity = min_quantity;
        }

        tracing::info!(part_id = %part_id, "Updated part details");
        Ok(slot.part.clone())
    }

    /// Take `quantity` units out of stock for an order.
    pub async fn reserve(&self, part_id: Uuid, quantity: u32) -> Result<Reservation, EngineError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity(0).into());
        }

        let slot = self.slot(part_id)?;
        let mut slot = lock_entity(&slot, "part", part_id, self.lock_timeout, &self.metrics).await?;
        if slot.removed {
            return Err(InventoryError::PartNotFound(part_id).into());
        }

        let available = slot.part.quantity_in_stock;
        if quantity > available {
            self.metrics.record_reservation("insufficient_stock");
            tracing::warn!(
                part_id = %part_id,
                requested = quantity,
                available = available,
                "Insufficient stock"
            );
            return Err(InventoryError::InsufficientStock { part_id, requested: quantity, available }.into());
        }

        slot.part.quantity_in_stock = available - quantity;
        slot.reserved += quantity;
        self.metrics.record_reservation("reserved");

        let reservation = Reservation {
            id: Uuid::new_v4(),
            part_id,
            quantity,
            unit_price: slot.part.unit_price,
        };

        tracing::info!(
            part_id = %part_id,
            reservation_id = %reservation.id,
            quantity = quantity,
            remaining = slot.part.quantity_in_stock,
            "Reserved stock"
        );

        Ok(reservation)
    }

    /// Return a reservation's units to stock.
    ///
    /// Each reservation must be released at most once; the ledger does not
    /// track individual reservation ids.
    pub async fn release(&self, reservation: &Reservation) -> Result<InventoryPart, EngineError> {
        let part_id = reservation.part_id;
        let slot = self.slot(part_id)?;
        let mut slot = lock_entity(&slot, "part", part_id, self.lock_timeout, &self.metrics).await?;
        if slot.removed {
            return Err(InventoryError::PartNotFound(part_id).into());
        }

        slot.part.quantity_in_stock = slot
            .part
            .quantity_in_stock
            .checked_add(reservation.quantity)
            .ok_or(InventoryError::InvalidQuantity(i64::from(reservation.quantity)))?;
        slot.reserved = slot.reserved.saturating_sub(reservation.quantity);
        self.metrics.record_release(reservation.quantity);

        tracing::info!(
            part_id = %part_id,
            reservation_id = %reservation.id,
            quantity = reservation.quantity,
            in_stock = slot.part.quantity_in_stock,
            "Released reservation"
        );

        Ok(slot.part.clone())
    }

    /// Manual correction (restock, write-off). The result must stay non-negative.
    pub async fn adjust_stock(&self, part_id: Uuid, delta: i64) -> Result<InventoryPart, EngineError> {
        let slot = self.slot(part_id)?;
        let mut slot = lock_entity(&slot, "part", part_id, self.lock_timeout, &self.metrics).await?;
        if slot.removed {
            return Err(InventoryError::PartNotFound(part_id).into());
        }

        let adjusted = i64::from(slot.part.quantity_in_stock) + delta;
        let adjusted = u32::try_from(adjusted).map_err(|_| InventoryError::InvalidQuantity(delta))?;
        slot.part.quantity_in_stock = adjusted;

        tracing::info!(part_id = %part_id, delta = delta, in_stock = adjusted, "Adjusted stock");
        Ok(slot.part.clone())
    }

    /// Remove a part from the catalog. Refused while any order holds a reservation on it.
    pub async fn remove_part(&self, part_id: Uuid) -> Result<(), EngineError> {
        let handle = self.slot(part_id)?;
        let mut slot = lock_entity(&handle, "part", part_id, self.lock_timeout, &self.metrics).await?;
        if slot.removed {
            return Err(InventoryError::PartNotFound(part_id).into());
        }
        if slot.reserved > 0 {
            return Err(InventoryError::PartInUse { part_id, reserved: slot.reserved }.into());
        }

        slot.removed = true;
        drop(slot);
        self.parts.remove(&part_id);

        tracing::info!(part_id = %part_id, "Removed part from catalog");
        Ok(())
    }

    /// Units of `part_id` currently held by live reservations
    pub async fn reserved_quantity(&self, part_id: Uuid) -> Result<u32, EngineError> {
        let slot = self.slot(part_id)?;
        let slot = lock_entity(&slot, "part", part_id, self.lock_timeout, &self.metrics).await?;
        Ok(slot.reserved)
    }

    pub async fn search_parts(&self, query: Option<&str>) -> Result<Vec<InventoryPart>, EngineError> {
        let mut parts = self.snapshot().await?;
        if let Some(query) = query {
            parts.retain(|part| part.matches_search(query));
        }
        Ok(parts)
    }

    pub async fn low_stock_parts(&self) -> Result<Vec<InventoryPart>, EngineError> {
        let mut parts = self.snapshot().await?;
        parts.retain(InventoryPart::is_low_stock);
        Ok(parts)
    }

    async fn snapshot(&self) -> Result<Vec<InventoryPart>, EngineError> {
        let handles: Vec<(Uuid, Arc<Mutex<PartSlot>>)> = self
            .parts
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut parts = Vec::with_capacity(handles.len());
        for (part_id, handle) in handles {
            let slot = lock_entity(&handle, "part", part_id, self.lock_timeout, &self.metrics).await?;
            if !slot.removed {
                parts.push(slot.part.clone());
            }
        }
        parts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parts)
    }
}
