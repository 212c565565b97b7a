/// Version identifiers are UUID v7, so ids sort roughly by creation time.
pub type VersionId = uuid::Uuid;

/// Owner identifiers are opaque strings supplied by the surrounding service.
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh version identifier.
pub fn new_version_id() -> VersionId {
    uuid::Uuid::now_v7()
}
