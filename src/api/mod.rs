//! Client side of the FormFlow Odoo integration API.

pub mod client;
pub mod payload;

pub use client::{ApiError, ClientConfig, FormFlowApi, HttpClient};
pub use payload::{AggregatedResponse, QuestionAggregate, QuestionPayload, TemplatePayload};
