// src/consts.rs
//! Shared constants: crypto parameters and wire-format strings

/// The only content algorithm envelopes are written with
pub const ENVELOPE_ALGORITHM: &str = "AES-256-GCM";

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length (96 bits)
pub const IV_LEN: usize = 12;

/// AES-GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Wrapped content key: nonce || encrypted key || tag
pub const WRAPPED_KEY_LEN: usize = IV_LEN + KEY_LEN + TAG_LEN;

/// Legacy per-recipient wrapping
pub const VERSION_PER_RECIPIENT: &str = "1.0";

/// Current shared-key list
pub const VERSION_SHARED_KEY: &str = "2.0";

/// Storage addresses are base64url(SHA-256) without padding
pub const STORAGE_ADDRESS_LEN: usize = 43;

/// Export file format tag
pub const EXPORT_FORMAT: &str = "iryshare-index-v1";

/// Default config file name, overridable with `IRYSHARE_CONFIG`
pub const DEFAULT_CONFIG_FILE: &str = "iryshare.toml";

/// Fallback MIME type when none can be guessed
pub const DEFAULT_FILE_TYPE: &str = "application/octet-stream";
