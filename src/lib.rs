//! Recreate a Google Drive folder and push local JSON build artifacts into it
//!
//! - service account auth: a JWT signed with the key file is exchanged for an access token
//! - destructive: the first folder found with the configured name is deleted before being recreated
//! - flat: only the direct entries of the source directory are considered
//!
//! # Quick Start
//! ```no_run
//! use drive_republish::{
//!     drive::Endpoints,
//!     publish::{republish, PublishConfig, PublishResult},
//! };
//!
//! #[tokio::main]
//! async fn main() -> PublishResult<()> {
//!     let config = PublishConfig::default()
//!         .with_folder_name("rock-paper-scissors")
//!         .with_source_dir(std::path::Path::new("build/contracts"));
//!
//!     let report = republish(config, Endpoints::default(), |status| println!("{}", status)).await?;
//!     println!("{} files uploaded", report.uploaded.len());
//!     Ok(())
//! }
//! ```
mod gcp;

pub use gcp::{drive, oauth2, publish, Client};
