pub mod client_meta;

pub use client_meta::{capture_client_meta, ClientMeta};
