//! # UpTask Client
//!
//! Typed HTTP client for the UpTask REST API.
//!
//! Every endpoint takes and returns the types in [`types`]. Responses are
//! checked against those types on arrival, so a server that drifts from the
//! expected shape surfaces as [`ClientError::Schema`] rather than as missing
//! data further along.
//!
//! ```no_run
//! use uptask_client::{types::ProjectFormData, UpTaskClient};
//!
//! # async fn example() -> Result<(), uptask_client::ClientError> {
//! let client = UpTaskClient::new("http://localhost:4000")?;
//! let project = client
//!     .create_project(&ProjectFormData {
//!         project_name: "Tienda".into(),
//!         client_name: "ACME".into(),
//!         description: "Tienda online".into(),
//!     })
//!     .await?;
//! println!("created {}", project.id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::UpTaskClient;
pub use error::{ClientError, ClientResult};
