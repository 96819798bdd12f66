/// Record ids are opaque strings (UUIDv7 text for locally created records).
pub type RecordId = String;

/// Owner identity: the authenticated user id, or [`GUEST_OWNER`].
pub type OwnerId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Owner id used when no session identity is present.
pub const GUEST_OWNER: &str = "guest";

/// Returns `true` for the unauthenticated placeholder owner.
pub fn is_guest(owner_id: &str) -> bool {
    owner_id.is_empty() || owner_id == GUEST_OWNER
}
