use crate::compiler_messages::compiler_errors::ErrorLocation;

/// A diagnostic produced by an analyzer rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerWarning {
    pub rule_id: &'static str,
    pub msg: String,
    pub location: ErrorLocation,
    pub warning_kind: WarningKind,
}

impl CompilerWarning {
    pub fn new(
        rule_id: &'static str,
        msg: impl Into<String>,
        location: ErrorLocation,
        warning_kind: WarningKind,
    ) -> CompilerWarning {
        CompilerWarning {
            rule_id,
            msg: msg.into(),
            location,
            warning_kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WarningKind {
    // A disposable object can lose its last reference without being disposed
    UndisposedObject {
        method: String,
        creation: String,
    },
}
