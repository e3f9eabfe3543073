//! Client-side core for creating and editing gateway API tokens: draft
//! state, time/quota normalization, payload assembly, and the REST calls
//! behind a token form. Rendering is left to the embedding front end.

pub mod client;
pub mod config;
pub mod controller;
pub mod draft;
pub mod error;
pub mod models;
pub mod services;

pub use client::ApiClient;
pub use config::ConsoleConfig;
pub use controller::{
    compute_visibility, CloseHandle, FieldVisibility, FormPhase, LoadOutcome, SubmitOutcome,
    TokenFormController,
};
pub use draft::{DisplayModes, DraftStore, TokenDraft, AUTO_GROUP};
pub use error::ConsoleError;
