//! Trait seams between the provider runtime and external implementations

mod record_api;

pub use record_api::RecordApi;
