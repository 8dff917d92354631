// pnut-api: Async Rust client for the pnut.io social network API

pub mod apps;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod notification;
pub mod streams;
pub mod websocket;

pub use client::{ApiRequest, Client};
pub use config::{API_BASE, Config};
pub use error::Error;
pub use models::{Meta, Stream};
pub use notification::{Notification, NotificationKind};
pub use streams::StreamParams;
pub use websocket::{MonitorEvent, MonitorHandle};
