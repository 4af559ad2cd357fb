use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Vehicle Registry
// ============================================================================
//
// The workshop does not own vehicles; it only reads who owns one and flips
// its availability when an order finishes or reopens.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleAvailability {
    Available,
    InService,
    Waiting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub owner_id: Option<Uuid>,
    pub availability: VehicleAvailability,
}

impl VehicleInfo {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(Uuid),

    #[error("Vehicle registry unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait VehicleRegistry: Send + Sync {
    async fn vehicle(&self, vehicle_id: Uuid) -> Result<Option<VehicleInfo>, RegistryError>;

    async fn set_availability(
        &self,
        vehicle_id: Uuid,
        availability: VehicleAvailability,
    ) -> Result<(), RegistryError>;
}

#[derive(Default)]
pub struct InMemoryVehicleRegistry {
    vehicles: DashMap<Uuid, VehicleInfo>,
}

impl InMemoryVehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, vehicle: VehicleInfo) {
        self.vehicles.insert(vehicle.id, vehicle);
    }

    pub fn availability(&self, vehicle_id: Uuid) -> Option<VehicleAvailability> {
        self.vehicles.get(&vehicle_id).map(|v| v.availability)
    }
}

#[async_trait]
impl VehicleRegistry for InMemoryVehicleRegistry {
    async fn vehicle(&self, vehicle_id: Uuid) -> Result<Option<VehicleInfo>, RegistryError> {
        Ok(self.vehicles.get(&vehicle_id).map(|v| v.clone()))
    }

    async fn set_availability(
        &self,
        vehicle_id: Uuid,
        availability: VehicleAvailability,
    ) -> Result<(), RegistryError> {
        let mut vehicle = self
            .vehicles
            .get_mut(&vehicle_id)
            .ok_or(RegistryError::VehicleNotFound(vehicle_id))?;
        vehicle.availability = availability;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_availability() {
        let registry = InMemoryVehicleRegistry::new();
        let id = Uuid::new_v4();
        registry.register(VehicleInfo {
            id,
            brand: "Skoda".into(),
            model: "Octavia".into(),
            owner_id: None,
            availability: VehicleAvailability::InService,
        });

        registry.set_availability(id, VehicleAvailability::Available).await.unwrap();
        assert_eq!(registry.availability(id), Some(VehicleAvailability::Available));
    }

    #[tokio::test]
    async fn test_unknown_vehicle() {
        let registry = InMemoryVehicleRegistry::new();
        let id = Uuid::new_v4();

        assert!(registry.vehicle(id).await.unwrap().is_none());
        let result = registry.set_availability(id, VehicleAvailability::Waiting).await;
        assert!(matches!(result, Err(RegistryError::VehicleNotFound(_))));
    }
}
