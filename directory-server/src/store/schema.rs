//! SQLite schema for the resource store.

/// Tables and indexes, applied idempotently on open.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS resources (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT NOT NULL,
    display_name        TEXT,
    address_line1       TEXT,
    address_line2       TEXT,
    city                TEXT,
    state               TEXT,
    zip                 TEXT,
    phone               TEXT,
    website             TEXT,
    hours               TEXT,
    latitude            REAL,
    longitude           REAL,
    accepts_uninsured   INTEGER NOT NULL DEFAULT 0,
    sliding_scale       INTEGER NOT NULL DEFAULT 0,
    free_care_available INTEGER NOT NULL DEFAULT 0,
    notes               TEXT,
    resource_type_id    INTEGER,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS resources_address_idx ON resources (lower(trim(address_line1)));

CREATE TABLE IF NOT EXISTS resource_services (
    resource_id INTEGER NOT NULL REFERENCES resources (id),
    service_id  INTEGER NOT NULL,
    PRIMARY KEY (resource_id, service_id)
);

CREATE TABLE IF NOT EXISTS resource_insurances (
    resource_id  INTEGER NOT NULL REFERENCES resources (id),
    insurance_id INTEGER NOT NULL,
    PRIMARY KEY (resource_id, insurance_id)
);

CREATE TABLE IF NOT EXISTS resource_languages (
    resource_id INTEGER NOT NULL REFERENCES resources (id),
    language_id INTEGER NOT NULL,
    PRIMARY KEY (resource_id, language_id)
);

CREATE TABLE IF NOT EXISTS resource_transportation (
    resource_id       INTEGER NOT NULL REFERENCES resources (id),
    transportation_id INTEGER NOT NULL,
    PRIMARY KEY (resource_id, transportation_id)
);

CREATE TABLE IF NOT EXISTS resource_feedback (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    resource_id INTEGER NOT NULL REFERENCES resources (id),
    rating      INTEGER,
    comment     TEXT,
    created_at  TEXT NOT NULL
);
";

/// Column list for `SELECT`s that map onto [`crate::domain::Resource`].
pub const RESOURCE_COLUMNS: &str = "id, name, display_name, address_line1, address_line2, \
     city, state, zip, phone, website, hours, latitude, longitude, \
     accepts_uninsured, sliding_scale, free_care_available, notes, \
     resource_type_id, created_at, updated_at";

/// A one-to-many link table hanging off `resources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssociationKind {
    Service,
    Insurance,
    Language,
    Transportation,
}

impl AssociationKind {
    /// Every link table, in a fixed order.
    pub const ALL: [AssociationKind; 4] = [
        AssociationKind::Service,
        AssociationKind::Insurance,
        AssociationKind::Language,
        AssociationKind::Transportation,
    ];

    pub fn table(self) -> &'static str {
        match self {
            AssociationKind::Service => "resource_services",
            AssociationKind::Insurance => "resource_insurances",
            AssociationKind::Language => "resource_languages",
            AssociationKind::Transportation => "resource_transportation",
        }
    }

    /// Name of the column holding the linked entity's id.
    pub fn column(self) -> &'static str {
        match self {
            AssociationKind::Service => "service_id",
            AssociationKind::Insurance => "insurance_id",
            AssociationKind::Language => "language_id",
            AssociationKind::Transportation => "transportation_id",
        }
    }
}
