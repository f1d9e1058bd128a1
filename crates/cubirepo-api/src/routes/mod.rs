//! # API Route Modules
//!
//! - `artifacts`: public downloads, `/{author}/{name}/{name}_{version}.{ext}`
//!   for the payload and `.json` for metadata.
//! - `session`: `/login/`, issuing the session cookie.
//! - `upload`: `POST /upload/`, multipart artifact submission.
//! - `delete`: `/delete/`, removal of stored artifacts.
//! - `manage`: `/manage/`, JSON listing of every registered artifact.
//!
//! `upload`, `delete` and `manage` sit behind the session gate.

pub mod artifacts;
pub mod delete;
pub mod manage;
pub mod session;
pub mod upload;
