//! Error types for the mining core and the model API.

/// Errors surfaced by parameter validation and the model API.
///
/// Constraint-logic outcomes (including "no patterns found") are normal
/// returns, never errors. The only runtime failure mode of the core is
/// allocation failure, which aborts the process as usual for Rust.
#[derive(Debug, thiserror::Error)]
pub enum MiningError {
    /// The sequence database is empty.
    /// The raw core accepts an empty database; the model API does not.
    #[error("sequence database is empty")]
    EmptyDatabase,

    /// A sequence contains no events.
    #[error("sequence {index} is empty")]
    EmptySequence { index: usize },

    /// An item id falls outside `1..=alphabet_size`.
    #[error("item {item} in sequence {index} is outside 1..={alphabet}")]
    ItemOutOfRange { index: usize, item: u32, alphabet: u32 },

    /// An attribute matrix does not match the sequence database shape.
    #[error("attribute {attribute} has a different shape than the sequences (sequence {index})")]
    AttributeShapeMismatch { attribute: usize, index: usize },

    /// A constraint references an attribute index that does not exist.
    #[error("constraint references attribute {attribute}, but only {num_attributes} attributes are defined")]
    AttributeIndexOutOfRange { attribute: usize, num_attributes: usize },

    /// A limit vector and its attribute-index vector differ in length.
    #[error("constraint vectors {name} and {name}i have different lengths")]
    ConstraintVectorMismatch { name: &'static str },

    /// A per-attribute metadata vector has the wrong length.
    #[error("per-attribute vector {name} must have one entry per attribute")]
    MetadataLengthMismatch { name: &'static str },

    /// A bound's attribute is missing from its family vector
    /// (`tot_spn` for span bounds, `tot_avr` for average bounds).
    #[error("attribute {attribute} of {name} does not appear in {family}")]
    BoundOutsideFamily { name: &'static str, family: &'static str, attribute: usize },

    /// The same constraint kind was added twice on one attribute.
    #[error("a {kind} constraint is already defined on this attribute")]
    DuplicateConstraint { kind: &'static str },

    /// A constraint was added without a lower or an upper bound.
    #[error("a {kind} constraint needs at least one bound")]
    UnboundedConstraint { kind: &'static str },

    /// The frequency threshold is outside its valid range.
    #[error("invalid minimum frequency: {reason}")]
    InvalidFrequency { reason: String },
}
