//! Order domain: the status machine, payment methods, and actor roles.
//!
//! Statuses travel as their canonical display strings (the values the
//! storefront and admin UIs render and submit). Transitions are validated
//! against an explicit adjacency table; the happy path is linear and
//! admin-driven, with user-reachable side branches for cancellation and
//! return requests.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cod,
    Stripe,
}

impl PaymentMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Stripe => "stripe",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<PaymentMethod> {
        match raw {
            "cod" => Some(PaymentMethod::Cod),
            "stripe" => Some(PaymentMethod::Stripe),
            _ => None,
        }
    }

    /// Redirect-based methods issue a payment reference at placement and
    /// settle asynchronously; COD settles on delivery.
    #[must_use]
    pub fn is_redirect(self) -> bool {
        matches!(self, PaymentMethod::Stripe)
    }
}

/// A denormalized line-item snapshot copied into an order at placement.
///
/// Decoupled from the live catalog on purpose: historical orders stay
/// stable even if the product is later edited or deleted.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: rust_decimal::Decimal,
    #[serde(default)]
    pub image: Vec<String>,
    pub size: String,
    pub quantity: u32,
}

impl OrderItem {
    /// Line revenue: price × quantity.
    #[must_use]
    pub fn line_total(&self) -> rust_decimal::Decimal {
        self.price * rust_decimal::Decimal::from(self.quantity)
    }
}

/// Shipping address fields captured at order time.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Placed,
    Packing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    ReturnRequested,
    ReturnApproved,
    ReturnRejected,
}

impl OrderStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "Order Placed",
            OrderStatus::Packing => "Packing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::ReturnRequested => "Return/Refund Requested",
            OrderStatus::ReturnApproved => "Return Approved",
            OrderStatus::ReturnRejected => "Return Rejected",
        }
    }

    /// Terminal absent further transitions. Delivered is terminal unless a
    /// return request follows.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Cancelled | OrderStatus::ReturnApproved | OrderStatus::ReturnRejected
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = TransitionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Order Placed" => Ok(OrderStatus::Placed),
            "Packing" => Ok(OrderStatus::Packing),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Out for Delivery" => Ok(OrderStatus::OutForDelivery),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            "Return/Refund Requested" => Ok(OrderStatus::ReturnRequested),
            "Return Approved" => Ok(OrderStatus::ReturnApproved),
            "Return Rejected" => Ok(OrderStatus::ReturnRejected),
            other => Err(TransitionError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("unknown order status: '{0}'")]
    UnknownStatus(String),
    #[error("cannot move an order from '{from}' to '{to}'")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("role '{role}' may not move an order from '{from}' to '{to}'")]
    Forbidden {
        role: &'static str,
        from: &'static str,
        to: &'static str,
    },
}

/// Validates a status transition for the acting role.
///
/// Admins may walk any edge of the adjacency table. Users are limited to
/// cancelling an order that is still "Order Placed" and requesting a
/// return on a "Delivered" order; anything else is `Forbidden` regardless
/// of whether the edge exists, so a user probing the API learns nothing
/// about admin-only edges.
///
/// # Errors
///
/// Returns [`TransitionError::Forbidden`] for a role violation and
/// [`TransitionError::InvalidTransition`] for an edge missing from the
/// adjacency table.
pub fn transition(current: OrderStatus, next: OrderStatus, actor: Role) -> Result<(), TransitionError> {
    use OrderStatus as S;

    let user_allowed = matches!(
        (current, next),
        (S::Placed, S::Cancelled) | (S::Delivered, S::ReturnRequested)
    );

    match actor {
        Role::User => {
            if user_allowed {
                Ok(())
            } else {
                Err(TransitionError::Forbidden {
                    role: actor.as_str(),
                    from: current.as_str(),
                    to: next.as_str(),
                })
            }
        }
        Role::Admin => {
            let edge = matches!(
                (current, next),
                (S::Placed, S::Packing)
                    | (S::Packing, S::Shipped)
                    | (S::Shipped, S::OutForDelivery)
                    | (S::OutForDelivery, S::Delivered)
                    | (S::Placed, S::Cancelled)
                    | (S::Delivered, S::ReturnRequested)
                    | (S::ReturnRequested, S::ReturnApproved)
                    | (S::ReturnRequested, S::ReturnRejected)
            );
            if edge {
                Ok(())
            } else {
                Err(TransitionError::InvalidTransition {
                    from: current.as_str(),
                    to: next.as_str(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus as S;

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            S::Placed,
            S::Packing,
            S::Shipped,
            S::OutForDelivery,
            S::Delivered,
            S::Cancelled,
            S::ReturnRequested,
            S::ReturnApproved,
            S::ReturnRejected,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        let err = "Teleported".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, TransitionError::UnknownStatus(_)));
    }

    #[test]
    fn admin_walks_the_happy_path() {
        for (from, to) in [
            (S::Placed, S::Packing),
            (S::Packing, S::Shipped),
            (S::Shipped, S::OutForDelivery),
            (S::OutForDelivery, S::Delivered),
        ] {
            assert_eq!(transition(from, to, Role::Admin), Ok(()));
        }
    }

    #[test]
    fn admin_cannot_skip_or_rewind() {
        assert!(matches!(
            transition(S::Placed, S::Shipped, Role::Admin),
            Err(TransitionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            transition(S::Delivered, S::Packing, Role::Admin),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn user_cancels_only_from_placed() {
        assert_eq!(transition(S::Placed, S::Cancelled, Role::User), Ok(()));
        for from in [S::Packing, S::Shipped, S::OutForDelivery, S::Delivered] {
            assert!(matches!(
                transition(from, S::Cancelled, Role::User),
                Err(TransitionError::Forbidden { .. })
            ));
        }
    }

    #[test]
    fn user_requests_return_only_from_delivered() {
        assert_eq!(
            transition(S::Delivered, S::ReturnRequested, Role::User),
            Ok(())
        );
        assert!(matches!(
            transition(S::Shipped, S::ReturnRequested, Role::User),
            Err(TransitionError::Forbidden { .. })
        ));
    }

    #[test]
    fn user_cannot_drive_fulfillment() {
        assert!(matches!(
            transition(S::Placed, S::Packing, Role::User),
            Err(TransitionError::Forbidden { .. })
        ));
        assert!(matches!(
            transition(S::ReturnRequested, S::ReturnApproved, Role::User),
            Err(TransitionError::Forbidden { .. })
        ));
    }

    #[test]
    fn return_requests_resolve_admin_only() {
        assert_eq!(
            transition(S::ReturnRequested, S::ReturnApproved, Role::Admin),
            Ok(())
        );
        assert_eq!(
            transition(S::ReturnRequested, S::ReturnRejected, Role::Admin),
            Ok(())
        );
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for terminal in [S::Cancelled, S::ReturnApproved, S::ReturnRejected] {
            assert!(terminal.is_terminal());
            for to in [S::Placed, S::Packing, S::Delivered, S::Cancelled] {
                assert!(transition(terminal, to, Role::Admin).is_err());
            }
        }
    }
}
