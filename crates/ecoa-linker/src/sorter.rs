//! Type Dependency Sorter - order a library's declarations for emission.
//!
//! Every declaration must follow everything it references inside the same
//! library, either directly (field, item, base or selector type) or through
//! a `%ns:Name%` literal in a bound, range or value. References to other
//! libraries are skipped: those libraries are emitted on their own and
//! included by the referencing one.
//!
//! ## Algorithm
//!
//! Depth-first over the declarations in declaration order:
//!
//! 1. A declaration already placed is skipped
//! 2. A declaration currently being visited means a cycle:
//!    [`ModelError::CyclicTypeDependency`] with the chain that closed it
//! 3. Otherwise visit every same-library reference, then place it
//!
//! Unrelated declarations keep their relative order, and sorting an
//! already sorted sequence returns it unchanged.
//!
//! ## Example
//!
//! ```text
//! L: [ Array Arr { maxNumber = %L:K% }, Constant K = 5 ]
//!
//! sorted: [ K, Arr ]
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use ecoa_core::type_ref::normalize_namespace;
use ecoa_core::{ModelError, TypeDecl};
use ecoa_registry::TypeRegistry;

/// Sorts the declarations of one library.
pub struct TypeSorter<'reg> {
    registry: &'reg TypeRegistry,
    library: String,
}

struct SortState<'d> {
    decls: &'d [TypeDecl],
    by_name: FxHashMap<&'d str, usize>,
    placed: FxHashSet<usize>,
    visiting: Vec<usize>,
    ordered: Vec<&'d TypeDecl>,
}

impl<'reg> TypeSorter<'reg> {
    /// Create a sorter for `library`, resolving names through `registry`.
    pub fn new(registry: &'reg TypeRegistry, library: &str) -> Self {
        Self {
            registry,
            library: normalize_namespace(library),
        }
    }

    /// Sort the declarations of the library registered under this sorter's name.
    pub fn sort_registered(&self) -> Result<Vec<TypeDecl>, ModelError> {
        let decls: Vec<TypeDecl> = self
            .registry
            .library_types(&self.library)
            .map(|types| types.cloned().collect())
            .unwrap_or_default();
        Ok(self.sort(&decls)?.into_iter().cloned().collect())
    }

    /// Reorder `decls` so that dependencies come first.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn sort<'d>(&self, decls: &'d [TypeDecl]) -> Result<Vec<&'d TypeDecl>, ModelError> {
        let mut state = SortState {
            decls,
            by_name: decls
                .iter()
                .enumerate()
                .map(|(i, d)| (d.name(), i))
                .collect(),
            placed: FxHashSet::default(),
            visiting: Vec::new(),
            ordered: Vec::with_capacity(decls.len()),
        };
        for index in 0..decls.len() {
            self.visit(index, &mut state)?;
        }
        Ok(state.ordered)
    }

    fn visit(&self, index: usize, state: &mut SortState<'_>) -> Result<(), ModelError> {
        if state.placed.contains(&index) {
            return Ok(());
        }
        if let Some(pos) = state.visiting.iter().position(|&i| i == index) {
            let mut chain: Vec<String> = state.visiting[pos..]
                .iter()
                .map(|&i| state.decls[i].name().to_string())
                .collect();
            chain.push(state.decls[index].name().to_string());
            return Err(ModelError::CyclicTypeDependency {
                library: self.library.clone(),
                chain,
            });
        }

        let decl = &state.decls[index];
        state.visiting.push(index);
        let context = format!("{} {}:{}", decl.category().name(), self.library, decl.name());
        for reference in decl.references() {
            let target = self
                .registry
                .resolve_from(reference.name(), &self.library, &context)?;
            if target.namespace != self.library {
                continue;
            }
            if let Some(&dependency) = state.by_name.get(target.name.as_str()) {
                self.visit(dependency, state)?;
            }
        }
        state.visiting.pop();

        trace!(library = %self.library, name = decl.name(), "placed type");
        state.placed.insert(index);
        state.ordered.push(decl);
        Ok(())
    }
}
