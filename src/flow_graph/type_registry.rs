use crate::compiler_messages::compiler_errors::{CompilerError, ErrorLocation, ErrorType};
use crate::flow_graph::flow_nodes::{MethodId, TypeId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ======================================================
//                   TYPE INFORMATION
// ======================================================

/// A type the host knows about, and whether it implements the dispose pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: String,
    #[serde(default)]
    pub disposable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MethodKind {
    #[default]
    Ordinary,
    Constructor,
    /// Releases the receiver (`Dispose`, `Close`, `DisposeAsync`)
    Dispose,
}

/// What a callee does with a disposable argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParameterOwnership {
    /// Nothing is known, so the argument may be retained
    #[default]
    Unknown,
    /// Only used for the duration of the call
    Borrowed,
    /// A dispose helper, the callee disposes the argument
    DisposesArgument,
    /// The callee (usually a wrapping constructor) becomes responsible for disposal
    TransfersOwnership,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub id: MethodId,
    pub name: String,
    #[serde(default)]
    pub containing_type: Option<TypeId>,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub parameters: Vec<ParameterOwnership>,
}

// ======================================================
//                      REGISTRY
// ======================================================

/// Answers the type-system questions the dispose analysis needs.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: FxHashMap<TypeId, TypeInfo>,
    methods: FxHashMap<MethodId, MethodInfo>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_declarations(
        types: Vec<TypeInfo>,
        methods: Vec<MethodInfo>,
    ) -> Result<Self, CompilerError> {
        let mut registry = Self::new();
        for type_info in types {
            registry.register_type(type_info)?;
        }
        for method in methods {
            registry.register_method(method)?;
        }

        Ok(registry)
    }

    pub fn register_type(&mut self, type_info: TypeInfo) -> Result<(), CompilerError> {
        if self.types.contains_key(&type_info.id) {
            return Err(CompilerError::new(
                format!(
                    "Type '{}' ({}) is already registered.",
                    type_info.name, type_info.id
                ),
                ErrorLocation::default(),
                ErrorType::Compiler,
            ));
        }

        self.types.insert(type_info.id, type_info);
        Ok(())
    }

    pub fn register_method(&mut self, method: MethodInfo) -> Result<(), CompilerError> {
        if self.methods.contains_key(&method.id) {
            return Err(CompilerError::new(
                format!(
                    "Method '{}' ({}) is already registered.",
                    method.name, method.id
                ),
                ErrorLocation::default(),
                ErrorType::Compiler,
            ));
        }

        self.methods.insert(method.id, method);
        Ok(())
    }

    pub fn get_type(&self, type_id: TypeId) -> Option<&TypeInfo> {
        self.types.get(&type_id)
    }

    pub fn get_method(&self, method_id: MethodId) -> Option<&MethodInfo> {
        self.methods.get(&method_id)
    }

    /// Unknown types are treated as not disposable
    pub fn is_disposable(&self, type_id: TypeId) -> bool {
        self.types
            .get(&type_id)
            .map(|type_info| type_info.disposable)
            .unwrap_or(false)
    }

    pub fn has_any_disposable_type(&self) -> bool {
        self.types.values().any(|type_info| type_info.disposable)
    }

    pub fn disposes_instance(&self, method_id: MethodId) -> bool {
        self.methods
            .get(&method_id)
            .map(|method| method.kind == MethodKind::Dispose)
            .unwrap_or(false)
    }

    pub fn parameter_ownership(&self, method_id: MethodId, index: usize) -> ParameterOwnership {
        self.methods
            .get(&method_id)
            .and_then(|method| method.parameters.get(index).copied())
            .unwrap_or_default()
    }

    pub fn type_name(&self, type_id: TypeId) -> String {
        self.types
            .get(&type_id)
            .map(|type_info| type_info.name.clone())
            .unwrap_or_else(|| format!("{}", type_id))
    }
}
