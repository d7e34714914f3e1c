//! sablec-drv - Compiler Driver
//!
//! Orchestrates the pipeline: parse -> scope build & validation ->
//! typecheck -> MIR lowering. `compile_source` is the single entry point;
//! the result is a [`CompilationUnit`] holding, per module, the lowered
//! `function name -> Ebb` table together with the inferred type store.

use std::io::Read;

use indexmap::IndexMap;
use sablec_mir::{Ebb, LowerError, ModuleBuilder};
use sablec_par::{parse_source, Ast};
use sablec_sem::{
    Function, ItemId, ScopeTree, TypeCheckError, TypeChecker, TypeId, TypeStore,
};
use sablec_util::{Diagnostic, Handler, Symbol};
use thiserror::Error;
use tracing::debug;

/// Module name used when the caller does not supply one.
pub const DEFAULT_MODULE: &str = "__main__";

/// Compiler input: source text, or a readable text stream.
pub enum SourceInput {
    Text(String),
    Reader(Box<dyn Read>),
}

impl From<&str> for SourceInput {
    fn from(text: &str) -> Self {
        SourceInput::Text(text.to_string())
    }
}

impl From<String> for SourceInput {
    fn from(text: String) -> Self {
        SourceInput::Text(text)
    }
}

impl From<Box<dyn Read>> for SourceInput {
    fn from(reader: Box<dyn Read>) -> Self {
        SourceInput::Reader(reader)
    }
}

/// A failed compilation.
///
/// Validation batches its findings into a diagnostic list; every other
/// phase aborts on the first error.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read source input: {0}")]
    Source(#[from] std::io::Error),

    #[error("source failed to parse with {} error(s)", .0.len())]
    Parse(Vec<Diagnostic>),

    #[error("validation failed with {} error(s)", .0.len())]
    Invalid(Vec<Diagnostic>),

    #[error(transparent)]
    Type(#[from] TypeCheckError),

    #[error(transparent)]
    Lower(#[from] LowerError),
}

impl CompileError {
    /// The collected diagnostics, when this error carries a batch.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Parse(diagnostics) | CompileError::Invalid(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

/// One compiled module: its semantic root and the lowered function table.
#[derive(Debug)]
pub struct ModuleUnit {
    pub root: ItemId,
    pub functions: IndexMap<Symbol, Ebb>,
}

/// The output of a successful compilation.
#[derive(Debug)]
pub struct CompilationUnit {
    ast: Ast,
    tree: ScopeTree,
    tcx: TypeStore,
    modules: IndexMap<String, ModuleUnit>,
}

impl CompilationUnit {
    /// The type store, for post-hoc reconstruction and diagnostics.
    pub fn type_ctx(&self) -> &TypeStore {
        &self.tcx
    }

    pub fn scope_tree(&self) -> &ScopeTree {
        &self.tree
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Module name to compiled module bundle, in insertion order.
    pub fn modules(&self) -> &IndexMap<String, ModuleUnit> {
        &self.modules
    }

    /// Look up a function item by `"module.name"`.
    pub fn get_function(&self, qualified: &str) -> Option<&Function> {
        let (module, name) = qualified.split_once('.')?;
        let unit = self.modules.get(module)?;

        for item in self.tree.function_items(unit.root) {
            if let Some(func) = self.tree.item(item).function.as_ref() {
                if func.name.as_str() == name {
                    return Some(func);
                }
            }
        }
        None
    }

    /// Size in bytes of the (resolved) type behind `id`.
    pub fn size_of(&self, id: TypeId) -> Option<usize> {
        self.tcx.size_of(id)
    }
}

/// Compile a source module under the default module name.
pub fn compile_source(input: impl Into<SourceInput>) -> Result<CompilationUnit, CompileError> {
    compile_module(input, DEFAULT_MODULE)
}

/// Compile a source module under an explicit module name.
pub fn compile_module(
    input: impl Into<SourceInput>,
    module_name: &str,
) -> Result<CompilationUnit, CompileError> {
    let source = match input.into() {
        SourceInput::Text(text) => text,
        SourceInput::Reader(mut reader) => {
            let mut text = String::new();
            reader.read_to_string(&mut text)?;
            text
        }
    };

    debug!(module = module_name, bytes = source.len(), "compiling source");

    let handler = Handler::new();
    let (ast, module) = parse_source(&source, &handler);
    if handler.has_errors() {
        return Err(CompileError::Parse(handler.take()));
    }

    let (mut tree, root) = ScopeTree::build_module(&ast, &module, &handler);
    if handler.has_errors() {
        return Err(CompileError::Invalid(handler.take()));
    }

    let mut tcx = TypeStore::new();
    TypeChecker::new(&ast, &mut tree, &mut tcx).check_module(root)?;

    let functions = ModuleBuilder::new(&ast, &tree, &mut tcx).lower(root)?;
    debug!(
        module = module_name,
        functions = functions.len(),
        "lowered module to MIR"
    );

    let mut modules = IndexMap::new();
    modules.insert(
        module_name.to_string(),
        ModuleUnit { root, functions },
    );

    Ok(CompilationUnit {
        ast,
        tree,
        tcx,
        modules,
    })
}
