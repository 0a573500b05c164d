//! Runtime error type surfaced by the executor and built-ins.

use crate::program::Loc;

#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub message: String,
    pub loc: Option<Loc>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
            loc: None,
        }
    }

    pub fn at(message: impl Into<String>, loc: Loc) -> Self {
        RuntimeError {
            message: message.into(),
            loc: Some(loc),
        }
    }

    /// Attach a statement location if the error does not already carry one.
    pub fn with_loc(mut self, loc: Loc) -> Self {
        if self.loc.is_none() {
            self.loc = Some(loc);
        }
        self
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.loc {
            Some(loc) => write!(f, "RuntimeError: {} at {}", self.message, loc),
            None => write!(f, "RuntimeError: {}", self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = RuntimeError::at("Subscript out of range", Loc::new(3, 7));
        assert_eq!(
            err.to_string(),
            "RuntimeError: Subscript out of range at line 3, col 7"
        );
    }

    #[test]
    fn with_loc_does_not_overwrite() {
        let err = RuntimeError::at("x", Loc::new(1, 1)).with_loc(Loc::new(9, 9));
        assert_eq!(err.loc, Some(Loc::new(1, 1)));
    }

    #[test]
    fn display_without_location() {
        let err = RuntimeError::new("Division by zero");
        assert_eq!(err.to_string(), "RuntimeError: Division by zero");
    }
}
