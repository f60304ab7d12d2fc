use crate::compiler_messages::compiler_errors::CompilerError;
use crate::flow_graph::flow_nodes::MethodBody;
use crate::flow_graph::type_registry::{MethodInfo, TypeInfo, TypeRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything a host hands over for one compilation: the type facts and every analysed body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compilation {
    #[serde(default)]
    pub types: Vec<TypeInfo>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub bodies: Vec<MethodBody>,
}

impl Compilation {
    pub fn from_json(source: &str) -> Result<Self, CompilerError> {
        serde_json::from_str(source).map_err(|error| {
            CompilerError::compiler_error(format!("Could not parse compilation JSON: {error}"))
        })
    }

    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let source = fs::read_to_string(path)
            .map_err(|error| CompilerError::file_error(path, error.to_string()))?;

        Self::from_json(&source).map_err(|error| error.with_file_path(path.to_path_buf()))
    }

    pub fn type_registry(&self) -> Result<TypeRegistry, CompilerError> {
        TypeRegistry::from_declarations(self.types.clone(), self.methods.clone())
    }
}

#[cfg(test)]
#[path = "tests/compilation_tests.rs"]
mod tests;
