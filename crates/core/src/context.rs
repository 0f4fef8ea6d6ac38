//! ActionContext - operator identity and reason for a mutation
//!
//! Every money-moving call carries the operator who triggered it and a
//! free-text reason. The request boundary validates the reason is
//! non-empty; the engine persists it verbatim into the audit record.

use serde::{Deserialize, Serialize};

/// Operator identity + reason attached to every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionContext {
    /// Identifier of the operator (backoffice user id)
    pub operator_id: String,
    /// Display identity of the operator
    pub operator_name: String,
    /// Free-text reason supplied by the operator
    pub reason: String,
}

impl ActionContext {
    pub fn new(
        operator_id: impl Into<String>,
        operator_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            operator_id: operator_id.into(),
            operator_name: operator_name.into(),
            reason: reason.into(),
        }
    }

    /// True if the reason carries non-whitespace content.
    pub fn has_reason(&self) -> bool {
        !self.reason.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_reason() {
        let ctx = ActionContext::new("op-1", "Jane Doe", "customer request");
        assert!(ctx.has_reason());

        let blank = ActionContext::new("op-1", "Jane Doe", "   ");
        assert!(!blank.has_reason());
    }
}
