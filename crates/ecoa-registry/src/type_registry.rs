//! Type Registry - flat namespace -> name -> declaration storage.
//!
//! Every library's declarations are registered under the library's
//! (normalized) namespace. Built-in basic types live in the reserved
//! [`STANDARD_LIBRARY`] namespace and are seeded at construction.
//!
//! ## Resolution
//!
//! ```text
//! "lib:Speed"  -> lib:Speed           (qualified: checked, returned as is)
//! "Speed"      -> first library declaring Speed, in registration order
//! "int32"      -> ECOA:int32          (built-in fallback)
//! "Missing"    -> ModelError::UnresolvedType
//! ```

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

use ecoa_core::type_ref::normalize_namespace;
use ecoa_core::{CategoryMask, ModelError, STANDARD_LIBRARY, TypeCategory, TypeDecl, TypeRef};

/// Built-in types of the standard library.
const BUILTIN_TYPES: &[(&str, TypeCategory)] = &[
    ("boolean8", TypeCategory::Simple),
    ("int8", TypeCategory::Simple),
    ("char8", TypeCategory::Simple),
    ("byte", TypeCategory::Simple),
    ("int16", TypeCategory::Simple),
    ("int32", TypeCategory::Simple),
    ("uint8", TypeCategory::Simple),
    ("uint16", TypeCategory::Simple),
    ("uint32", TypeCategory::Simple),
    ("float32", TypeCategory::Simple),
    ("double64", TypeCategory::Simple),
    ("int64", TypeCategory::Simple),
    ("uint64", TypeCategory::Simple),
    ("return_status", TypeCategory::Simple),
    ("hr_time", TypeCategory::Record),
    ("global_time", TypeCategory::Record),
    ("duration", TypeCategory::Record),
    ("log", TypeCategory::Record),
    ("error_id", TypeCategory::Simple),
    ("error_code", TypeCategory::Simple),
    ("asset_id", TypeCategory::Simple),
    ("asset_type", TypeCategory::Simple),
    ("error_type", TypeCategory::Simple),
    ("recovery_action_type", TypeCategory::Simple),
    ("pinfo_filename", TypeCategory::Record),
    ("seek_whence_type", TypeCategory::Simple),
];

/// Registry of every declared and built-in type.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    /// namespace -> name -> declaration, in registration order.
    libraries: IndexMap<String, IndexMap<String, TypeDecl>>,
    builtins: FxHashMap<&'static str, TypeCategory>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry seeded with the built-in types.
    pub fn new() -> Self {
        Self {
            libraries: IndexMap::new(),
            builtins: BUILTIN_TYPES.iter().copied().collect(),
        }
    }

    /// Register all declarations of a library.
    pub fn register_library(&mut self, name: &str, types: &[TypeDecl]) -> Result<(), ModelError> {
        let namespace = normalize_namespace(name);
        let library = self.libraries.entry(namespace.clone()).or_default();
        for decl in types {
            let qualified = TypeRef::new(&namespace, decl.name());
            let shadows_builtin = namespace == STANDARD_LIBRARY
                && BUILTIN_TYPES.iter().any(|(n, _)| *n == decl.name());
            if shadows_builtin || library.contains_key(decl.name()) {
                return Err(ModelError::DuplicateType {
                    name: qualified.to_string(),
                });
            }
            library.insert(decl.name().to_string(), decl.clone());
        }
        debug!(library = %namespace, types = types.len(), "registered library");
        Ok(())
    }

    /// Resolve a bare or qualified name without failing.
    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        let name = name.trim();
        if let Some(qualified) = TypeRef::parse(name) {
            return self.contains(&qualified).then_some(qualified);
        }
        self.libraries
            .iter()
            .find(|(_, types)| types.contains_key(name))
            .map(|(namespace, _)| TypeRef::new(namespace, name))
            .or_else(|| {
                self.builtins
                    .contains_key(name)
                    .then(|| TypeRef::standard(name))
            })
    }

    /// Resolve a bare or qualified name. `context` locates the reference in
    /// the error.
    pub fn resolve(&self, name: &str, context: &str) -> Result<TypeRef, ModelError> {
        self.lookup(name)
            .ok_or_else(|| ModelError::unresolved_type(name, context))
    }

    /// Resolve a name referenced from inside `library`, preferring that
    /// library's own declarations for bare names.
    pub fn resolve_from(
        &self,
        name: &str,
        library: &str,
        context: &str,
    ) -> Result<TypeRef, ModelError> {
        let bare = name.trim();
        if !bare.contains(':') {
            let namespace = normalize_namespace(library);
            if self
                .libraries
                .get(&namespace)
                .is_some_and(|types| types.contains_key(bare))
            {
                return Ok(TypeRef::new(namespace, bare));
            }
        }
        self.resolve(name, context)
    }

    /// Whether the qualified reference names a registered or built-in type.
    pub fn contains(&self, ty: &TypeRef) -> bool {
        self.classify(ty).is_some()
    }

    /// Category of a resolved type.
    pub fn classify(&self, ty: &TypeRef) -> Option<TypeCategory> {
        if let Some(decl) = self.declaration(ty) {
            return Some(decl.category());
        }
        if ty.is_standard() {
            return self.builtins.get(ty.name.as_str()).copied();
        }
        None
    }

    /// Declaration of a library type. Built-ins have none.
    pub fn declaration(&self, ty: &TypeRef) -> Option<&TypeDecl> {
        self.libraries.get(&ty.namespace)?.get(&ty.name)
    }

    /// Follow constants down to the type they are declared with.
    pub fn underlying(&self, ty: &TypeRef, context: &str) -> Result<TypeRef, ModelError> {
        let mut current = ty.clone();
        // A constant chain longer than the registry means the chain loops.
        for _ in 0..=self.len() {
            match self.declaration(&current) {
                Some(TypeDecl::Constant { type_name, .. }) => {
                    current = self.resolve_from(type_name, &current.namespace, context)?;
                }
                _ => return Ok(current),
            }
        }
        Err(ModelError::CyclicTypeDependency {
            library: ty.namespace.clone(),
            chain: vec![ty.name.clone(), current.name],
        })
    }

    /// Search library types by namespace and/or name, filtered by category.
    pub fn find_all(
        &self,
        namespace: Option<&str>,
        name: Option<&str>,
        categories: CategoryMask,
    ) -> Vec<(TypeRef, &TypeDecl)> {
        let namespace = namespace.map(normalize_namespace);
        self.libraries
            .iter()
            .filter(|(ns, _)| namespace.as_ref().is_none_or(|wanted| wanted == *ns))
            .flat_map(|(ns, types)| {
                types
                    .values()
                    .map(move |decl| (TypeRef::new(ns, decl.name()), decl))
            })
            .filter(|(_, decl)| name.is_none_or(|wanted| wanted == decl.name()))
            .filter(|(_, decl)| categories.admits(decl.category()))
            .collect()
    }

    /// Registered library namespaces, in registration order.
    pub fn libraries(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    /// Declarations of a library, in declaration order.
    pub fn library_types(&self, library: &str) -> Option<impl Iterator<Item = &TypeDecl>> {
        self.libraries
            .get(&normalize_namespace(library))
            .map(|types| types.values())
    }

    /// Number of declared library types (built-ins excluded).
    pub fn len(&self) -> usize {
        self.libraries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(name: &str, ty: &str, value: &str) -> TypeDecl {
        TypeDecl::Constant {
            name: name.into(),
            type_name: ty.into(),
            value: value.into(),
        }
    }

    fn record(name: &str) -> TypeDecl {
        TypeDecl::Record {
            name: name.into(),
            fields: vec![],
        }
    }

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_library("nav.geo", &[record("Position"), constant("K", "int32", "5")])
            .unwrap();
        reg.register_library("other", &[record("Position")]).unwrap();
        reg
    }

    #[test]
    fn builtins_seeded() {
        let reg = TypeRegistry::new();
        let t = reg.resolve("int32", "test").unwrap();
        assert_eq!(t, TypeRef::standard("int32"));
        assert_eq!(reg.classify(&t), Some(TypeCategory::Simple));
        assert_eq!(
            reg.classify(&TypeRef::standard("duration")),
            Some(TypeCategory::Record)
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn bare_name_searches_libraries_first() {
        let reg = registry();
        let t = reg.resolve("Position", "test").unwrap();
        assert_eq!(t.to_string(), "nav__geo:Position");
    }

    #[test]
    fn resolve_from_prefers_own_library() {
        let reg = registry();
        let t = reg.resolve_from("Position", "other", "test").unwrap();
        assert_eq!(t.to_string(), "other:Position");
    }

    #[test]
    fn qualified_names_are_checked() {
        let reg = registry();
        assert!(reg.resolve("nav.geo:K", "test").is_ok());
        let err = reg.resolve("nav.geo:Missing", "field p").unwrap_err();
        assert_eq!(
            err,
            ModelError::UnresolvedType {
                name: "nav.geo:Missing".into(),
                context: "field p".into()
            }
        );
    }

    #[test]
    fn unknown_bare_name_fails() {
        let reg = registry();
        assert!(matches!(
            reg.resolve("Nope", "test"),
            Err(ModelError::UnresolvedType { .. })
        ));
    }

    #[test]
    fn duplicate_declaration_rejected() {
        let mut reg = TypeRegistry::new();
        let err = reg
            .register_library("lib", &[record("A"), record("A")])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateType {
                name: "lib:A".into()
            }
        );
    }

    #[test]
    fn underlying_follows_constants() {
        let mut reg = TypeRegistry::new();
        reg.register_library(
            "lib",
            &[
                constant("Base", "uint16", "3"),
                constant("Alias", "Base", "%lib:Base%"),
            ],
        )
        .unwrap();
        let t = reg.underlying(&TypeRef::new("lib", "Alias"), "test").unwrap();
        assert_eq!(t, TypeRef::standard("uint16"));
    }

    #[test]
    fn find_all_filters() {
        let reg = registry();
        let records = reg.find_all(None, Some("Position"), CategoryMask::RECORD);
        assert_eq!(records.len(), 2);
        let constants = reg.find_all(Some("nav.geo"), None, CategoryMask::CONSTANT);
        assert_eq!(constants.len(), 1);
        assert_eq!(constants[0].0.to_string(), "nav__geo:K");
        assert!(reg.find_all(Some("other"), None, CategoryMask::ENUM).is_empty());
    }
}
