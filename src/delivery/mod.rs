//! Delivery gateway — best-effort, out-of-band messaging of clarified
//! instructions. Decoupled from the turn coordinator: a delivery failure
//! never affects conversation state.

pub mod gateway;
pub mod phone;

pub use gateway::{DeliveryError, DeliveryGateway, WhatsAppGateway};
pub use phone::{DefaultNormalizer, NumberNormalizer};
