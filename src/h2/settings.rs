//! HTTP/2 settings (RFC 7540 Section 6.5)
//!
//! Connection-wide parameters negotiated through SETTINGS frames and, on
//! the h2c upgrade path, through the base64url `HTTP2-Settings` header.

use super::error::{Error, Result};
use super::frames::SettingEntry;
use std::fmt;

/// SETTINGS parameter identifiers (RFC 7540 Section 6.5.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SettingsParameter {
    /// SETTINGS_HEADER_TABLE_SIZE (0x1)
    HeaderTableSize = 0x1,
    /// SETTINGS_ENABLE_PUSH (0x2)
    EnablePush = 0x2,
    /// SETTINGS_MAX_CONCURRENT_STREAMS (0x3)
    MaxConcurrentStreams = 0x3,
    /// SETTINGS_INITIAL_WINDOW_SIZE (0x4)
    InitialWindowSize = 0x4,
    /// SETTINGS_MAX_FRAME_SIZE (0x5)
    MaxFrameSize = 0x5,
    /// SETTINGS_MAX_HEADER_LIST_SIZE (0x6)
    MaxHeaderListSize = 0x6,
}

impl SettingsParameter {
    /// Convert to u16
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Create from u16
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x1 => Some(SettingsParameter::HeaderTableSize),
            0x2 => Some(SettingsParameter::EnablePush),
            0x3 => Some(SettingsParameter::MaxConcurrentStreams),
            0x4 => Some(SettingsParameter::InitialWindowSize),
            0x5 => Some(SettingsParameter::MaxFrameSize),
            0x6 => Some(SettingsParameter::MaxHeaderListSize),
            _ => None,
        }
    }

    /// Get parameter name
    pub fn name(&self) -> &'static str {
        match self {
            SettingsParameter::HeaderTableSize => "HEADER_TABLE_SIZE",
            SettingsParameter::EnablePush => "ENABLE_PUSH",
            SettingsParameter::MaxConcurrentStreams => "MAX_CONCURRENT_STREAMS",
            SettingsParameter::InitialWindowSize => "INITIAL_WINDOW_SIZE",
            SettingsParameter::MaxFrameSize => "MAX_FRAME_SIZE",
            SettingsParameter::MaxHeaderListSize => "MAX_HEADER_LIST_SIZE",
        }
    }
}

impl fmt::Display for SettingsParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:x})", self.name(), self.as_u16())
    }
}

/// The connection's effective settings.
///
/// `max_header_list_size` of `None` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub header_table_size: u32,
    pub enable_push: bool,
    pub max_concurrent_streams: u32,
    pub initial_window_size: u32,
    pub max_frame_size: u32,
    pub max_header_list_size: Option<u32>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            header_table_size: 4096,
            enable_push: true,
            max_concurrent_streams: 64,
            initial_window_size: 65535,
            max_frame_size: 16384,
            max_header_list_size: None,
        }
    }
}

impl ConnectionSettings {
    /// Apply one parameter; unknown identifiers are ignored per RFC 7540.
    pub fn set(&mut self, id: u16, value: u32) {
        match SettingsParameter::from_u16(id) {
            Some(SettingsParameter::HeaderTableSize) => self.header_table_size = value,
            Some(SettingsParameter::EnablePush) => self.enable_push = value == 1,
            Some(SettingsParameter::MaxConcurrentStreams) => {
                self.max_concurrent_streams = value
            }
            Some(SettingsParameter::InitialWindowSize) => self.initial_window_size = value,
            Some(SettingsParameter::MaxFrameSize) => self.max_frame_size = value,
            Some(SettingsParameter::MaxHeaderListSize) => {
                self.max_header_list_size = Some(value)
            }
            None => {}
        }
    }

    /// Apply every entry of a SETTINGS frame.
    pub fn apply_entries(&mut self, entries: &[SettingEntry]) {
        for entry in entries {
            self.set(entry.id, entry.value);
        }
    }

    /// Apply a raw settings payload (the `HTTP2-Settings` header body):
    /// zero or more 6-octet `(u16 id, u32 value)` entries.
    pub fn decode_payload(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() % 6 != 0 {
            return Err(Error::Protocol(format!(
                "settings payload length {} not a multiple of 6",
                payload.len()
            )));
        }
        for entry in payload.chunks_exact(6) {
            let id = u16::from_be_bytes([entry[0], entry[1]]);
            let value = u32::from_be_bytes([entry[2], entry[3], entry[4], entry[5]]);
            self.set(id, value);
        }
        Ok(())
    }
}
