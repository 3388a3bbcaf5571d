//! Order models and the order status state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::PaymentMethod;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Received,
    InPreparation,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Received => "received",
            OrderStatus::InPreparation => "in_preparation",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(OrderStatus::Draft),
            "received" => Some(OrderStatus::Received),
            "in_preparation" => Some(OrderStatus::InPreparation),
            "ready" => Some(OrderStatus::Ready),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether an order may move from `self` to `next`.
    ///
    /// Forward-only kitchen flow; cancellation is allowed from any
    /// non-terminal status. Delivered and cancelled are terminal. A request
    /// repeating the current status is not a transition; callers treat it
    /// as a retry and accept it without effects.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if *self == next {
            return false;
        }
        match (*self, next) {
            (Draft, Received) | (Draft, Cancelled) => true,
            (Received, InPreparation) | (Received, Cancelled) => true,
            (InPreparation, Ready) | (InPreparation, Cancelled) => true,
            (Ready, Delivered) | (Ready, Cancelled) => true,
            _ => false,
        }
    }

    /// Statuses that commit the order's ingredient consumption. Entering one
    /// of these triggers stock deduction (once, guarded by the order's
    /// `stock_deducted` flag).
    pub fn commits_stock(&self) -> bool {
        matches!(self, OrderStatus::Ready | OrderStatus::Delivered)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// A customer order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub pizzeria_id: Uuid,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
    /// Idempotency guard for stock deduction. Once true, no status change
    /// deducts stock again.
    pub stock_deducted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Timestamp for the sale movement derived on delivery: the order's
    /// creation time, so period reports attribute the revenue to when the
    /// order was placed rather than when it was delivered.
    pub fn sale_moved_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

impl OrderItem {
    pub fn subtotal_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}
