//! Daraja (M-PESA) STK-push gateway adapter.

mod dto;
mod http_gateway;

pub use http_gateway::{MpesaConfig, MpesaHttpGateway};
