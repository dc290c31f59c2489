pub mod client;
pub mod fetcher;

pub use client::{ChannelEntity, EntityKind, GatewayClient, RawMessage, TelegramApi, TelegramError};
pub use fetcher::{FetchBounds, FetchOptions};
