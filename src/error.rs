use thiserror::Error;

/// Errors the generator can report to its caller.
///
/// Per the error taxonomy in the specification, a solver stall or region overflow is not
/// fatal — the pipeline still runs to completion and produces a usable (if imperfect) grid,
/// so those cases are not represented here; they are surfaced through `log` instead.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// `W < 4`, `L < 4`, or `H < 1`. Mirrors the "no grid" contract in §6/§7.
    #[error("invalid grid size {width}x{length}x{height}: width and length must be >= 4, height >= 1")]
    InvalidSize {
        width: u32,
        length: u32,
        height: u32,
    },
}
