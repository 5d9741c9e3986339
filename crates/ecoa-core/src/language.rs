//! Implementation languages and the cross-language casting policy.
//!
//! Two binding dialects coexist in one system: C and C++. They differ in how
//! qualified names are spelled (`ns__Name` vs `ns::Name`), how enum labels
//! are written, and in the casts needed when an argument crosses from a
//! module written in one dialect to a module written in the other.
//!
//! ## Casting Policy
//!
//! ```text
//!               C -> C++                         C++ -> C
//! enum          ns::T((ns::T::EnumValues) arg)   (ns__T) arg
//! complex       (ns::T&)* arg                    (ns__T*)& arg
//! other         (ns::T) arg                      (ns__T) arg
//! ```
//!
//! Complex types are arrays, fixed arrays, records and variant records.
//! Same-language bindings never cast.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::type_ref::TypeRef;
use crate::types::TypeCategory;

/// Supported implementation language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "c")]
    C,
    #[serde(rename = "c++")]
    Cpp,
}

impl Language {
    /// Parse a language name, ignoring case. Returns `None` for anything
    /// other than `c` and `c++`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "c" => Some(Language::C),
            "c++" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "c++",
        }
    }

    /// Separator between namespace segments and names.
    pub fn separator(self) -> &'static str {
        match self {
            Language::C => "__",
            Language::Cpp => "::",
        }
    }

    /// Spell a qualified type name in this language.
    pub fn qualify(self, ty: &TypeRef) -> String {
        let sep = self.separator();
        let namespace = ty.namespace_path().collect::<Vec<_>>().join(sep);
        format!("{namespace}{sep}{}", ty.name)
    }

    /// Spell an enum label of `ty` in this language.
    pub fn enum_label(self, ty: &TypeRef, label: &str) -> String {
        match self {
            Language::C => format!("{}_{label}", self.qualify(ty)),
            Language::Cpp => format!("{}::{label}", self.qualify(ty)),
        }
    }

    /// Spell a `ns:Name` (or `ns.sub:Name`) constant reference in this language.
    pub fn constant_reference(self, reference: &str) -> String {
        let sep = self.separator();
        reference.replace([':', '.'], sep)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cast applied to an argument passed from one language to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentCast {
    /// Same language, pass through.
    None,
    /// C enum value into a C++ enum class.
    EnumToCpp,
    /// C++ enum class into a C enum value.
    EnumToC,
    /// Simple value cast into the C++ type.
    ValueToCpp,
    /// Simple value cast into the C type.
    ValueToC,
    /// Complex C object reinterpreted as a C++ reference.
    ComplexToCpp,
    /// Complex C++ object reinterpreted through a C pointer.
    ComplexToC,
}

impl ArgumentCast {
    /// Select the cast for an argument of `category` sent from `from` to `to`.
    pub fn between(from: Language, to: Language, category: TypeCategory) -> Self {
        match (from, to) {
            (Language::C, Language::C) | (Language::Cpp, Language::Cpp) => ArgumentCast::None,
            (Language::C, Language::Cpp) => match category {
                TypeCategory::Enum => ArgumentCast::EnumToCpp,
                c if c.is_complex() => ArgumentCast::ComplexToCpp,
                _ => ArgumentCast::ValueToCpp,
            },
            (Language::Cpp, Language::C) => match category {
                TypeCategory::Enum => ArgumentCast::EnumToC,
                c if c.is_complex() => ArgumentCast::ComplexToC,
                _ => ArgumentCast::ValueToC,
            },
        }
    }

    /// Render the argument expression with the cast applied.
    pub fn apply(self, argument: &str, ty: &TypeRef) -> String {
        match self {
            ArgumentCast::None => argument.to_string(),
            ArgumentCast::EnumToCpp => {
                let cpp = Language::Cpp.qualify(ty);
                format!("{cpp}(({cpp}::EnumValues) {argument})")
            }
            ArgumentCast::EnumToC => format!("({}) {argument}", Language::C.qualify(ty)),
            ArgumentCast::ValueToCpp => format!("({}) {argument}", Language::Cpp.qualify(ty)),
            ArgumentCast::ValueToC => format!("({}) {argument}", Language::C.qualify(ty)),
            ArgumentCast::ComplexToCpp => format!("({}&)* {argument}", Language::Cpp.qualify(ty)),
            ArgumentCast::ComplexToC => format!("({}*)& {argument}", Language::C.qualify(ty)),
        }
    }
}

/// Numeric literal suffix for constants of a built-in base type.
pub fn literal_suffix(base_type: &str) -> &'static str {
    let name = base_type.rsplit(':').next().unwrap_or(base_type);
    match name {
        "int32" => "L",
        "uint32" => "UL",
        "int64" => "LL",
        "uint64" => "LLU",
        "float32" => "F",
        _ => "",
    }
}

/// Render a constant value as a literal of `base_type`.
///
/// A single non-digit character becomes a character literal; numbers get
/// the suffix of their base type.
pub fn constant_literal(value: &str, base_type: &str) -> String {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_ascii_digit() => format!("'{c}'"),
        _ => format!("{value}{}", literal_suffix(base_type)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> TypeRef {
        TypeRef::parse(s).unwrap()
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Language::parse("C"), Some(Language::C));
        assert_eq!(Language::parse("C++"), Some(Language::Cpp));
        assert_eq!(Language::parse(" c++ "), Some(Language::Cpp));
        assert_eq!(Language::parse("Ada"), None);
    }

    #[test]
    fn qualify_nested_namespace() {
        let t = ty("nav.geo:Position");
        assert_eq!(Language::C.qualify(&t), "nav__geo__Position");
        assert_eq!(Language::Cpp.qualify(&t), "nav::geo::Position");
    }

    #[test]
    fn enum_labels() {
        let t = ty("lib:Mode");
        assert_eq!(Language::C.enum_label(&t, "IDLE"), "lib__Mode_IDLE");
        assert_eq!(Language::Cpp.enum_label(&t, "IDLE"), "lib::Mode::IDLE");
    }

    #[test]
    fn same_language_never_casts() {
        for category in [TypeCategory::Enum, TypeCategory::Record, TypeCategory::Simple] {
            assert_eq!(
                ArgumentCast::between(Language::C, Language::C, category),
                ArgumentCast::None
            );
            assert_eq!(
                ArgumentCast::between(Language::Cpp, Language::Cpp, category),
                ArgumentCast::None
            );
        }
    }

    #[test]
    fn enum_casts() {
        let t = ty("lib:Mode");
        let to_cpp = ArgumentCast::between(Language::C, Language::Cpp, TypeCategory::Enum);
        assert_eq!(to_cpp.apply("mode", &t), "lib::Mode((lib::Mode::EnumValues) mode)");
        let to_c = ArgumentCast::between(Language::Cpp, Language::C, TypeCategory::Enum);
        assert_eq!(to_c.apply("mode", &t), "(lib__Mode) mode");
    }

    #[test]
    fn complex_and_value_casts() {
        let rec = ty("lib:Track");
        let to_cpp = ArgumentCast::between(Language::C, Language::Cpp, TypeCategory::Record);
        assert_eq!(to_cpp.apply("track", &rec), "(lib::Track&)* track");
        let to_c = ArgumentCast::between(Language::Cpp, Language::C, TypeCategory::FixedArray);
        assert_eq!(to_c.apply("track", &rec), "(lib__Track*)& track");

        let speed = ty("lib:Speed");
        let simple = ArgumentCast::between(Language::Cpp, Language::C, TypeCategory::Simple);
        assert_eq!(simple.apply("v", &speed), "(lib__Speed) v");
    }

    #[test]
    fn suffixes_and_literals() {
        assert_eq!(literal_suffix("int32"), "L");
        assert_eq!(literal_suffix("ECOA:uint64"), "LLU");
        assert_eq!(literal_suffix("int8"), "");
        assert_eq!(constant_literal("5", "uint32"), "5UL");
        assert_eq!(constant_literal("x", "char8"), "'x'");
        assert_eq!(constant_literal("1.5", "float32"), "1.5F");
    }

    #[test]
    fn constant_reference_spelling() {
        assert_eq!(Language::C.constant_reference("nav.geo:K"), "nav__geo__K");
        assert_eq!(Language::Cpp.constant_reference("lib:K"), "lib::K");
    }
}
