use crate::flow_graph::flow_nodes::SourceSpan;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

// The final set of errors and warnings emitted from the analyzers
#[derive(Debug, Default)]
pub struct CompilerMessages {
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<crate::compiler_messages::compiler_warnings::CompilerWarning>,
}

impl CompilerMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_output(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    CompilationStage,
    PrimarySuggestion,
}

/// Where an error points: the input file it came from and a span inside the analysed source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLocation {
    pub scope: PathBuf,
    pub span: SourceSpan,
}

impl ErrorLocation {
    pub fn new(scope: PathBuf, span: SourceSpan) -> Self {
        Self { scope, span }
    }

    pub fn from_span(span: SourceSpan) -> Self {
        Self {
            scope: PathBuf::new(),
            span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub msg: String,
    pub location: ErrorLocation,
    pub error_type: ErrorType,

    // Structured extras for more detailed error output
    pub metadata: HashMap<ErrorMetaDataKey, &'static str>,
}

impl CompilerError {
    pub fn new(msg: impl Into<String>, location: ErrorLocation, error_type: ErrorType) -> Self {
        CompilerError {
            msg: msg.into(),
            location,
            error_type,
            metadata: HashMap::new(),
        }
    }

    pub fn with_file_path(mut self, file_path: PathBuf) -> Self {
        self.location.scope = file_path;
        self
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: &'static str) {
        self.metadata.insert(key, value);
    }

    /// Malformed flow graph handed over by the host
    pub fn new_flow_graph_error(msg: impl Into<String>, location: ErrorLocation) -> Self {
        Self::new(msg, location, ErrorType::FlowGraph)
    }

    /// The host cancelled the pass while a method was being analysed.
    /// Callers must stop, not report this as a per-method failure.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::new(msg, ErrorLocation::default(), ErrorType::Cancelled)
    }

    pub fn new_config_error(path: &std::path::Path, msg: impl Into<String>) -> Self {
        Self::new(
            msg,
            ErrorLocation::new(path.to_path_buf(), SourceSpan::default()),
            ErrorType::Config,
        )
    }

    pub fn file_error(path: &std::path::Path, msg: impl Into<String>) -> Self {
        Self::new(
            msg,
            ErrorLocation::new(path.to_path_buf(), SourceSpan::default()),
            ErrorType::File,
        )
    }

    /// Create a compiler error (internal bug, not user's fault)
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        Self::new(msg, ErrorLocation::default(), ErrorType::Compiler)
    }

    pub fn is_cancellation(&self) -> bool {
        self.error_type == ErrorType::Cancelled
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} error: {}", self.error_type, self.msg)
    }
}

impl std::error::Error for CompilerError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    DisposeAnalysis,
    FlowGraph,
    Cancelled,
    Config,
    File,
    Compiler,
}

/// Returns a dispose analysis error from the current function.
///
/// Usage: `return_dispose_analysis_error!(msg, location, { CompilationStage => "Dispose Analysis" })`
#[macro_export]
macro_rules! return_dispose_analysis_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::compiler_messages::compiler_errors::ErrorType::DisposeAnalysis,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::compiler_messages::compiler_errors::ErrorMetaDataKey::$key, $value); )*
                map
            },
        })
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::compiler_messages::compiler_errors::ErrorType::DisposeAnalysis,
            metadata: std::collections::HashMap::new(),
        })
    };
}
