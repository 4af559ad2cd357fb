use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::messaging::Notification;
use crate::registry::VehicleAvailability;
use super::events::{OrderCompleted, OrderEvent, OrderReopened};
use super::value_objects::OrderStatus;

// ============================================================================
// Status Engine
// ============================================================================
//
// Pure decisions about order status:
// 1. After a task mutation, does the order enter or leave Completed?
// 2. Which side effects does a committed batch of events owe the outside world?
//
// Effects are returned, never performed. Vehicle availability writes run while
// the order lock is still held, so they land in commit order. Notifications
// run once the lock is released.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    SetVehicleAvailability {
        vehicle_id: Uuid,
        availability: VehicleAvailability,
    },
    NotifyVehicleOwner {
        vehicle_id: Uuid,
        notification: Notification,
    },
}

impl SideEffect {
    /// Effects that must be applied in the order's commit order.
    pub fn is_vehicle_state(&self) -> bool {
        matches!(self, SideEffect::SetVehicleAvailability { .. })
    }
}

/// Task counters as they will be once the pending task event is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskProgress {
    pub total: usize,
    pub done: usize,
}

impl TaskProgress {
    pub fn all_done(&self) -> bool {
        self.total > 0 && self.done == self.total
    }
}

/// Completed iff there is at least one task and every task is done.
///
/// Only transitions produce an event: an order that stays Completed (or stays
/// open) yields `None`.
pub fn evaluate_completion(
    current: OrderStatus,
    progress: TaskProgress,
    now: DateTime<Utc>,
) -> Option<OrderEvent> {
    match (current == OrderStatus::Completed, progress.all_done()) {
        (false, true) => Some(OrderEvent::Completed(OrderCompleted { ended_at: now })),
        (true, false) => Some(OrderEvent::Reopened(OrderReopened { reopened_at: now })),
        _ => None,
    }
}

pub fn effects_for(order_id: Uuid, vehicle_id: Uuid, events: &[OrderEvent]) -> Vec<SideEffect> {
    let mut effects = Vec::new();

    for event in events {
        match event {
            OrderEvent::Completed(_) => {
                effects.push(SideEffect::SetVehicleAvailability {
                    vehicle_id,
                    availability: VehicleAvailability::Available,
                });
                effects.push(SideEffect::NotifyVehicleOwner {
                    vehicle_id,
                    notification: Notification::OrderFinished { order_id },
                });
            }
            OrderEvent::Reopened(_) => {
                effects.push(SideEffect::SetVehicleAvailability {
                    vehicle_id,
                    availability: VehicleAvailability::InService,
                });
            }
            OrderEvent::StatusChanged(e) => {
                effects.push(SideEffect::NotifyVehicleOwner {
                    vehicle_id,
                    notification: Notification::OrderStatusChanged {
                        order_id,
                        status: e.to,
                    },
                });
            }
            _ => {}
        }
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::events::OrderStatusChanged;

    #[test]
    fn test_completion_requires_at_least_one_task() {
        let now = Utc::now();
        let empty = TaskProgress { total: 0, done: 0 };

        assert!(evaluate_completion(OrderStatus::InProgress, empty, now).is_none());
        assert!(matches!(
            evaluate_completion(OrderStatus::Completed, empty, now),
            Some(OrderEvent::Reopened(_))
        ));
    }

    #[test]
    fn test_completion_fires_only_on_transition() {
        let now = Utc::now();
        let all_done = TaskProgress { total: 2, done: 2 };
        let one_open = TaskProgress { total: 2, done: 1 };

        assert!(matches!(
            evaluate_completion(OrderStatus::WaitingParts, all_done, now),
            Some(OrderEvent::Completed(OrderCompleted { ended_at })) if ended_at == now
        ));
        assert!(evaluate_completion(OrderStatus::Completed, all_done, now).is_none());
        assert!(evaluate_completion(OrderStatus::New, one_open, now).is_none());
        assert!(matches!(
            evaluate_completion(OrderStatus::Completed, one_open, now),
            Some(OrderEvent::Reopened(_))
        ));
    }

    #[test]
    fn test_completed_frees_vehicle_then_notifies_owner() {
        let order_id = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();
        let events = vec![OrderEvent::Completed(OrderCompleted { ended_at: Utc::now() })];

        let effects = effects_for(order_id, vehicle_id, &events);

        assert_eq!(
            effects,
            vec![
                SideEffect::SetVehicleAvailability {
                    vehicle_id,
                    availability: VehicleAvailability::Available,
                },
                SideEffect::NotifyVehicleOwner {
                    vehicle_id,
                    notification: Notification::OrderFinished { order_id },
                },
            ]
        );
    }

    #[test]
    fn test_reopened_returns_vehicle_to_service_without_notifying() {
        let vehicle_id = Uuid::new_v4();
        let events = vec![OrderEvent::Reopened(OrderReopened { reopened_at: Utc::now() })];

        let effects = effects_for(Uuid::new_v4(), vehicle_id, &events);

        assert_eq!(
            effects,
            vec![SideEffect::SetVehicleAvailability {
                vehicle_id,
                availability: VehicleAvailability::InService,
            }]
        );
    }

    #[test]
    fn test_only_availability_is_vehicle_state() {
        let vehicle_id = Uuid::new_v4();
        let events = vec![OrderEvent::Completed(OrderCompleted { ended_at: Utc::now() })];

        let (state, notices): (Vec<_>, Vec<_>) = effects_for(Uuid::new_v4(), vehicle_id, &events)
            .into_iter()
            .partition(SideEffect::is_vehicle_state);

        assert_eq!(state.len(), 1);
        assert!(matches!(notices[..], [SideEffect::NotifyVehicleOwner { .. }]));
    }

    #[test]
    fn test_manual_status_change_notifies_with_new_status() {
        let order_id = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();
        let events = vec![OrderEvent::StatusChanged(OrderStatusChanged {
            from: OrderStatus::New,
            to: OrderStatus::WaitingParts,
            changed_at: Utc::now(),
        })];

        let effects = effects_for(order_id, vehicle_id, &events);

        assert_eq!(
            effects,
            vec![SideEffect::NotifyVehicleOwner {
                vehicle_id,
                notification: Notification::OrderStatusChanged {
                    order_id,
                    status: OrderStatus::WaitingParts,
                },
            }]
        );
    }
}
