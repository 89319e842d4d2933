/// Length-contract violations raised by the kernel entry points.
///
/// Every variant is an invalid-argument failure: the inputs could never have
/// produced a result, so none is computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    #[error("length mismatch: query has {query} elements, document has {doc}")]
    LengthMismatch { query: usize, doc: usize },

    #[error("query length {actual} must equal document length {doc_len} * {planes}")]
    QueryLength {
        actual: usize,
        doc_len: usize,
        planes: usize,
    },

    #[error("bit vector too short: {dims} dimensions need {required} bytes, got {actual}")]
    BitVectorTooShort {
        dims: usize,
        required: usize,
        actual: usize,
    },

    #[error("packed output has {actual} bytes, expected {expected}")]
    PackedLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, KernelError>;
