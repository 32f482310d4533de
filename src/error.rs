use core::fmt;

/// Result alias for `spectra`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the affinity, Laplacian, eigensolver and clustering stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Two lengths that must agree do not.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Shape mismatch (string description).
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// An iterative solver exhausted its budget before reaching tolerance.
    ConvergenceFailure {
        /// Number of iterations (sweeps) attempted.
        iterations: usize,
        /// Residual left when the budget ran out.
        residual: f64,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Not enough independent eigenvectors remained after orthogonalization.
    RankDeficient {
        /// Number of vectors requested.
        requested: usize,
        /// Number of vectors that survived.
        found: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::ConvergenceFailure {
                iterations,
                residual,
            } => {
                write!(
                    f,
                    "did not converge after {iterations} iterations (residual {residual:.3e})"
                )
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::RankDeficient { requested, found } => {
                write!(
                    f,
                    "spectral basis is rank deficient: requested {requested} vectors, found {found}"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// Data-quality findings that do not stop a fit.
///
/// These correspond to numerical degeneracies in the input graph. They are
/// logged at `warn` level and returned alongside the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Vertex has no positive affinity to any other vertex.
    IsolatedVertex {
        /// Vertex index.
        index: usize,
    },
    /// The affinity graph splits into several components.
    DisconnectedGraph {
        /// Number of components carrying a zero eigenvalue.
        n_components: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::IsolatedVertex { index } => {
                write!(f, "vertex {index} is isolated (zero degree)")
            }
            Warning::DisconnectedGraph { n_components } => {
                write!(
                    f,
                    "graph is not fully connected ({n_components} components)"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = Error::InvalidParameter {
            name: "gamma",
            message: "must be positive",
        };
        assert_eq!(e.to_string(), "invalid parameter 'gamma': must be positive");

        let e = Error::ConvergenceFailure {
            iterations: 3,
            residual: 0.5,
        };
        assert!(e.to_string().contains("3 iterations"));

        let w = Warning::DisconnectedGraph { n_components: 2 };
        assert!(w.to_string().contains("2 components"));
    }
}
