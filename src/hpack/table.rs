//! HPACK index tables (RFC 7541 Sections 2.3 and 4)
//!
//! One address space spans the fixed static table (indices 1..=61) and a
//! connection's dynamic table (indices 62 and up, most recently added
//! first). The dynamic table is bounded by a byte budget; insertions evict
//! the oldest entries until the table fits.

use super::{DecodeError, Header, Result};
use std::collections::VecDeque;

/// Default dynamic table budget in octets
pub const DEFAULT_MAX_SIZE: usize = 4096;

/// The static table (RFC 7541 Appendix A), 1-indexed on the wire and
/// stored 0-indexed here.
const STATIC_TABLE: [(&str, &str); 61] = [
    (":authority", ""),                  //  1
    (":method", "GET"),                  //  2
    (":method", "POST"),                 //  3
    (":path", "/"),                      //  4
    (":path", "/index.html"),            //  5
    (":scheme", "http"),                 //  6
    (":scheme", "https"),                //  7
    (":status", "200"),                  //  8
    (":status", "204"),                  //  9
    (":status", "206"),                  // 10
    (":status", "304"),                  // 11
    (":status", "400"),                  // 12
    (":status", "404"),                  // 13
    (":status", "500"),                  // 14
    ("accept-charset", ""),              // 15
    ("accept-encoding", "gzip, deflate"), // 16
    ("accept-language", ""),             // 17
    ("accept-ranges", ""),               // 18
    ("accept", ""),                      // 19
    ("access-control-allow-origin", ""), // 20
    ("age", ""),                         // 21
    ("allow", ""),                       // 22
    ("authorization", ""),               // 23
    ("cache-control", ""),               // 24
    ("content-disposition", ""),         // 25
    ("content-encoding", ""),            // 26
    ("content-language", ""),            // 27
    ("content-length", ""),              // 28
    ("content-location", ""),            // 29
    ("content-range", ""),               // 30
    ("content-type", ""),                // 31
    ("cookie", ""),                      // 32
    ("date", ""),                        // 33
    ("etag", ""),                        // 34
    ("expect", ""),                      // 35
    ("expires", ""),                     // 36
    ("from", ""),                        // 37
    ("host", ""),                        // 38
    ("if-match", ""),                    // 39
    ("if-modified-since", ""),           // 40
    ("if-none-match", ""),               // 41
    ("if-range", ""),                    // 42
    ("if-unmodified-since", ""),         // 43
    ("last-modified", ""),               // 44
    ("link", ""),                        // 45
    ("location", ""),                    // 46
    ("max-forwards", ""),                // 47
    ("proxy-authenticate", ""),          // 48
    ("proxy-authorization", ""),         // 49
    ("range", ""),                       // 50
    ("referer", ""),                     // 51
    ("refresh", ""),                     // 52
    ("retry-after", ""),                 // 53
    ("server", ""),                      // 54
    ("set-cookie", ""),                  // 55
    ("strict-transport-security", ""),   // 56
    ("transfer-encoding", ""),           // 57
    ("user-agent", ""),                  // 58
    ("vary", ""),                        // 59
    ("via", ""),                         // 60
    ("www-authenticate", ""),            // 61
];

/// Combined static + dynamic index table.
///
/// The dynamic side is a deque with the newest entry at the front, so
/// wire index 62 is `dynamic[0]` and eviction pops from the back.
#[derive(Debug)]
pub struct IndexTable {
    dynamic: VecDeque<Header>,
    current_size: usize,
    max_size: usize,
}

impl IndexTable {
    pub fn new() -> Self {
        IndexTable {
            dynamic: VecDeque::new(),
            current_size: 0,
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    /// Look up a 1-based index across the static and dynamic tables.
    pub fn get(&self, index: usize) -> Result<Header> {
        if index == 0 {
            return Err(DecodeError::InvalidIndex(index));
        }
        if index <= STATIC_TABLE.len() {
            let (name, value) = STATIC_TABLE[index - 1];
            return Ok(Header::new(name, value));
        }
        self.dynamic
            .get(index - STATIC_TABLE.len() - 1)
            .cloned()
            .ok_or(DecodeError::InvalidIndex(index))
    }

    /// Insert a header at the front of the dynamic table and evict until
    /// the byte budget is respected again.
    pub fn add(&mut self, header: Header) {
        self.current_size += header.size();
        self.dynamic.push_front(header);
        self.evict();
    }

    /// Apply a dynamic table size update and evict immediately.
    pub fn update_max_size(&mut self, size: usize) {
        self.max_size = size;
        self.evict();
    }

    fn evict(&mut self) {
        while self.current_size > self.max_size {
            // current_size > 0 here, so the deque cannot be empty
            if let Some(oldest) = self.dynamic.pop_back() {
                self.current_size -= oldest.size();
            } else {
                self.current_size = 0;
            }
        }
    }

    /// Number of entries currently in the dynamic table.
    pub fn dynamic_len(&self) -> usize {
        self.dynamic.len()
    }

    /// Octets currently charged against the budget.
    pub fn current_size(&self) -> usize {
        self.current_size
    }
}

impl Default for IndexTable {
    fn default() -> Self {
        Self::new()
    }
}
