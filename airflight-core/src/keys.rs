use std::fmt;

pub const USERS: &str = "users";
pub const FLIGHTS: &str = "flights";
pub const BOOKINGS: &str = "bookings";

/// Characters the realtime database refuses inside a single key.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// Slash-separated location inside the remote document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn root(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    pub fn users() -> Self {
        Self::root(USERS)
    }

    pub fn flights() -> Self {
        Self::root(FLIGHTS)
    }

    pub fn bookings() -> Self {
        Self::root(BOOKINGS)
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the first segment that the database would reject, if any.
    pub fn invalid_segment(&self) -> Option<&str> {
        self.segments
            .iter()
            .find(|s| !is_valid_key(s))
            .map(String::as_str)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| FORBIDDEN_KEY_CHARS.contains(&c) || c.is_control())
}

/// Booking collections are keyed by the session email with every `.` turned into `_`.
///
/// Lossy: `a.b@x.com` and `a_b@x.com` share a collection. Any other character the
/// database refuses is percent-encoded.
pub fn booking_owner_key(email: &str) -> String {
    escape_key(email, '_', &['%'])
}

/// User records are keyed by the lowercased email with `.` turned into `,`,
/// so the store can reject a second account for the same address.
///
/// `,` and `%` are percent-encoded along with the refused characters, which keeps
/// distinct addresses on distinct keys.
pub fn user_key(email: &str) -> String {
    escape_key(&email.to_lowercase(), ',', &[',', '%'])
}

fn escape_key(raw: &str, dot: char, also_escape: &[char]) -> String {
    let mut key = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '.' {
            key.push(dot);
        } else if FORBIDDEN_KEY_CHARS.contains(&c) || c.is_control() || also_escape.contains(&c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                key.push_str(&format!("%{:02X}", byte));
            }
        } else {
            key.push(c);
        }
    }
    key
}
