/// Rejected configuration. These are programming errors, caught at construction.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("the LOD threshold table is empty")]
    EmptyLodTable,

    #[error(
        "LOD threshold {index} has zoom {zoom}; zooms must be finite, positive and strictly increasing"
    )]
    UnorderedLodThreshold { index: usize, zoom: f64 },

    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },

    #[error("tie-break jitter must be finite and non-negative, got {0}")]
    InvalidJitter(f64),
}
