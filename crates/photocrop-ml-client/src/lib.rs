//! Client for the remote face-detection prediction service.
//!
//! The service follows a create-then-poll protocol: a prediction is created
//! with a base64 image, then its status URL is polled until it reaches a
//! terminal state or the poll deadline passes.

pub mod client;
pub mod error;
pub mod poll;
pub mod types;


pub use client::{FaceApiClient, FaceApiConfig};
pub use error::{MlError, MlResult};
pub use poll::PollPolicy;
pub use types::{Prediction, PredictionStatus, RawFace};
