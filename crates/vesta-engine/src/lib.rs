//! Vesta Engine — the domain services behind the REST layer: the
//! occupancy state machine, the reservation scheduler, announcement
//! publishing, notification fan-out, and fee/payment flows.
//!
//! Services are generic over the `vesta-core` repository traits, so
//! this crate has no database dependency. Every operation checks
//! policy first, then delegates to a repository whose state-changing
//! transitions are atomic check-and-act transactions.

pub mod announcement;
pub mod cascade;
pub mod finance;
pub mod notify;
pub mod occupancy;
pub mod reservation;

pub use announcement::AnnouncementService;
pub use finance::FinanceService;
pub use notify::{NotificationService, resolve_audience};
pub use occupancy::OccupancyService;
pub use reservation::{ReservationService, compute_cost};
