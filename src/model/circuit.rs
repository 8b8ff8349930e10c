//! Circuit property table

use num_complex::Complex64;

/// How the members of a circuit are connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitKind {
    #[default]
    Parallel,
    Series,
    /// Voltage gradient known a priori; total current derived at load
    PrescribedCurrent,
}

impl CircuitKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => CircuitKind::Series,
            c if c > 1 => CircuitKind::PrescribedCurrent,
            _ => CircuitKind::Parallel,
        }
    }
}

/// A circuit as read from the solution file
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    pub name: String,
    pub kind: CircuitKind,
    /// Total circuit current
    pub amps: Complex64,
}
