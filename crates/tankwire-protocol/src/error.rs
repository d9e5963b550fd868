//! Error types for the protocol layer.
//!
//! [`ProtocolError`] covers a whole frame: it could not be parsed, its
//! payload had the wrong shape, or its snapshot was corrupt. The snapshot
//! decoder reports the finer-grained [`SnapshotError`], which names the
//! cell, row or zone it choked on so a bad frame can be found in a capture.

use crate::Tag;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an envelope into bytes failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The frame is not a JSON object with a string `type` field.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The tag requires a payload and none was sent.
    #[error("`{tag}` envelope has no payload")]
    MissingPayload { tag: Tag },

    /// The payload did not match the shape expected for its tag.
    #[error("malformed `{tag}` payload: {source}")]
    MalformedPayload {
        tag: Tag,
        #[source]
        source: serde_json::Error,
    },

    /// A `gameState` payload failed to decode into a snapshot.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(#[from] SnapshotError),

    /// The envelope is not one of the outbound action tags.
    #[error("not an action envelope: `{0}`")]
    MalformedAction(Tag),
}

/// Why a `gameState` payload could not become a `WorldSnapshot`.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The payload as a whole did not have the `gameState` shape.
    #[error("unexpected snapshot shape: {0}")]
    Shape(#[source] serde_json::Error),

    /// The outer `tiles` array does not have one column per grid unit.
    #[error("tile grid has {actual} columns, expected {expected}")]
    ColumnCount { expected: usize, actual: usize },

    /// A column of `tiles` does not have one cell per grid unit.
    #[error("tile column {x} has {actual} cells, expected {expected}")]
    CellCount {
        x: usize,
        expected: usize,
        actual: usize,
    },

    /// A tile descriptor declared a kind this client does not know.
    #[error("tile ({x}, {y}): unknown entity kind `{kind}`")]
    UnknownEntity { x: usize, y: usize, kind: String },

    /// A tile descriptor's fields did not fit its declared kind.
    #[error("tile ({x}, {y}): malformed `{kind}`: {source}")]
    Entity {
        x: usize,
        y: usize,
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// The visibility grid has the wrong number of rows.
    #[error("visibility has {actual} rows, expected {expected}")]
    VisibilityRows { expected: usize, actual: usize },

    /// A visibility row has the wrong number of characters.
    #[error("visibility row {y} has {actual} cells, expected {expected}")]
    VisibilityWidth {
        y: usize,
        expected: usize,
        actual: usize,
    },

    /// A visibility character was neither `'0'` nor `'1'`.
    #[error("visibility ({x}, {y}): unexpected character {found:?}")]
    VisibilityChar { x: usize, y: usize, found: char },

    /// A zone's status did not match its declared `type`.
    #[error("zone {index}: bad status: {reason}")]
    ZoneStatus { index: u32, reason: String },

    /// A zone rectangle extends past the grid edge.
    #[error("zone {index} does not fit in a {dimension}x{dimension} grid")]
    ZoneOutOfBounds { index: u32, dimension: usize },
}
