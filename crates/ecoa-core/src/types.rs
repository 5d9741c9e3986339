//! Library type declarations.
//!
//! A library declares constants, simple types, enums, arrays, fixed arrays,
//! records and variant records. Declarations are built once when the
//! library is read and never mutated afterwards; later passes only reorder
//! or look them up.
//!
//! Type names inside a declaration are kept as written (bare or `ns:Name`).
//! Bounds and values are opaque strings, except that a `%ns:Name%` literal
//! is an indirect reference to a constant.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::type_ref::literal_reference;

/// Category of a resolved type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    Simple,
    Enum,
    Record,
    VariantRecord,
    Array,
    FixedArray,
    Constant,
}

impl TypeCategory {
    /// Complex types are passed by address across language boundaries.
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            TypeCategory::Array
                | TypeCategory::FixedArray
                | TypeCategory::Record
                | TypeCategory::VariantRecord
        )
    }

    /// Whether the category is a simple value or an enum.
    pub fn is_scalar(self) -> bool {
        matches!(self, TypeCategory::Simple | TypeCategory::Enum)
    }

    /// Single-bit mask for this category.
    pub fn mask(self) -> CategoryMask {
        match self {
            TypeCategory::Simple => CategoryMask::SIMPLE,
            TypeCategory::Enum => CategoryMask::ENUM,
            TypeCategory::Record => CategoryMask::RECORD,
            TypeCategory::VariantRecord => CategoryMask::VARIANT_RECORD,
            TypeCategory::Array => CategoryMask::ARRAY,
            TypeCategory::FixedArray => CategoryMask::FIXED_ARRAY,
            TypeCategory::Constant => CategoryMask::CONSTANT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeCategory::Simple => "simple",
            TypeCategory::Enum => "enum",
            TypeCategory::Record => "record",
            TypeCategory::VariantRecord => "variant record",
            TypeCategory::Array => "array",
            TypeCategory::FixedArray => "fixed array",
            TypeCategory::Constant => "constant",
        }
    }
}

bitflags! {
    /// Set of type categories, used to filter registry searches.
    ///
    /// ```rust
    /// use ecoa_core::{CategoryMask, TypeCategory};
    ///
    /// let arrays = CategoryMask::ARRAY | CategoryMask::FIXED_ARRAY;
    /// assert!(arrays.contains(TypeCategory::FixedArray.mask()));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CategoryMask: u8 {
        const SIMPLE = 1 << 0;
        const ENUM = 1 << 1;
        const RECORD = 1 << 2;
        const VARIANT_RECORD = 1 << 3;
        const ARRAY = 1 << 4;
        const FIXED_ARRAY = 1 << 5;
        const CONSTANT = 1 << 6;
    }
}

impl CategoryMask {
    /// Whether the mask admits the given category.
    pub fn admits(self, category: TypeCategory) -> bool {
        self.contains(category.mask())
    }
}

/// One label of an enum declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valnum: Option<String>,
}

/// Record or variant-record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Variant-record union member, selected when the selector equals `when`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Union {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub when: String,
}

/// A type declaration as written in a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum TypeDecl {
    Constant {
        name: String,
        #[serde(rename = "type")]
        type_name: String,
        value: String,
    },
    Simple {
        name: String,
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        min_range: Option<String>,
        #[serde(default)]
        max_range: Option<String>,
        #[serde(default)]
        precision: Option<String>,
    },
    Enum {
        name: String,
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        values: Vec<EnumValue>,
    },
    Array {
        name: String,
        item_type: String,
        max_number: String,
    },
    FixedArray {
        name: String,
        item_type: String,
        max_number: String,
    },
    Record {
        name: String,
        #[serde(default)]
        fields: Vec<Field>,
    },
    VariantRecord {
        name: String,
        select_name: String,
        select_type: String,
        #[serde(default)]
        fields: Vec<Field>,
        #[serde(default)]
        unions: Vec<Union>,
    },
}

/// A reference made by a declaration to another type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeReference<'a> {
    /// Direct type name (field type, item type, base type).
    Type(&'a str),
    /// Name inside a `%ns:Name%` literal (bound, range or value).
    Literal(&'a str),
}

impl<'a> TypeReference<'a> {
    /// The referenced name, bare or qualified.
    pub fn name(&self) -> &'a str {
        match self {
            TypeReference::Type(name) | TypeReference::Literal(name) => name,
        }
    }
}

impl TypeDecl {
    /// Declared name (without namespace).
    pub fn name(&self) -> &str {
        match self {
            TypeDecl::Constant { name, .. }
            | TypeDecl::Simple { name, .. }
            | TypeDecl::Enum { name, .. }
            | TypeDecl::Array { name, .. }
            | TypeDecl::FixedArray { name, .. }
            | TypeDecl::Record { name, .. }
            | TypeDecl::VariantRecord { name, .. } => name,
        }
    }

    pub fn category(&self) -> TypeCategory {
        match self {
            TypeDecl::Constant { .. } => TypeCategory::Constant,
            TypeDecl::Simple { .. } => TypeCategory::Simple,
            TypeDecl::Enum { .. } => TypeCategory::Enum,
            TypeDecl::Array { .. } => TypeCategory::Array,
            TypeDecl::FixedArray { .. } => TypeCategory::FixedArray,
            TypeDecl::Record { .. } => TypeCategory::Record,
            TypeDecl::VariantRecord { .. } => TypeCategory::VariantRecord,
        }
    }

    /// Every type this declaration references, in declaration order.
    pub fn references(&self) -> Vec<TypeReference<'_>> {
        let mut refs = Vec::new();
        match self {
            TypeDecl::Constant {
                type_name, value, ..
            } => {
                refs.push(TypeReference::Type(type_name));
                push_literal(Some(value), &mut refs);
            }
            TypeDecl::Simple {
                type_name,
                min_range,
                max_range,
                precision,
                ..
            } => {
                refs.push(TypeReference::Type(type_name));
                push_literal(min_range.as_ref(), &mut refs);
                push_literal(max_range.as_ref(), &mut refs);
                push_literal(precision.as_ref(), &mut refs);
            }
            TypeDecl::Enum {
                type_name, values, ..
            } => {
                refs.push(TypeReference::Type(type_name));
                for value in values {
                    push_literal(value.valnum.as_ref(), &mut refs);
                }
            }
            TypeDecl::Array {
                item_type,
                max_number,
                ..
            }
            | TypeDecl::FixedArray {
                item_type,
                max_number,
                ..
            } => {
                refs.push(TypeReference::Type(item_type));
                push_literal(Some(max_number), &mut refs);
            }
            TypeDecl::Record { fields, .. } => {
                refs.extend(fields.iter().map(|f| TypeReference::Type(&f.type_name)));
            }
            TypeDecl::VariantRecord {
                select_type,
                fields,
                unions,
                ..
            } => {
                refs.push(TypeReference::Type(select_type));
                refs.extend(fields.iter().map(|f| TypeReference::Type(&f.type_name)));
                refs.extend(unions.iter().map(|u| TypeReference::Type(&u.type_name)));
            }
        }
        refs
    }

    /// Item type of an array or fixed array.
    pub fn item_type(&self) -> Option<&str> {
        match self {
            TypeDecl::Array { item_type, .. } | TypeDecl::FixedArray { item_type, .. } => {
                Some(item_type)
            }
            _ => None,
        }
    }

    /// Size bound of an array or fixed array, as written.
    pub fn max_number(&self) -> Option<&str> {
        match self {
            TypeDecl::Array { max_number, .. } | TypeDecl::FixedArray { max_number, .. } => {
                Some(max_number)
            }
            _ => None,
        }
    }

    /// Labels of an enum.
    pub fn enum_values(&self) -> Option<&[EnumValue]> {
        match self {
            TypeDecl::Enum { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Base type of a constant, simple type or enum.
    pub fn base_type(&self) -> Option<&str> {
        match self {
            TypeDecl::Constant { type_name, .. }
            | TypeDecl::Simple { type_name, .. }
            | TypeDecl::Enum { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// Value of a constant.
    pub fn constant_value(&self) -> Option<&str> {
        match self {
            TypeDecl::Constant { value, .. } => Some(value),
            _ => None,
        }
    }
}

fn push_literal<'a>(value: Option<&'a String>, refs: &mut Vec<TypeReference<'a>>) {
    if let Some(name) = value.and_then(|v| literal_reference(v)) {
        refs.push(TypeReference::Literal(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_references_item_and_bound() {
        let arr = TypeDecl::Array {
            name: "Arr".into(),
            item_type: "int32".into(),
            max_number: "%L:K%".into(),
        };
        assert_eq!(
            arr.references(),
            vec![TypeReference::Type("int32"), TypeReference::Literal("L:K")]
        );
        assert_eq!(arr.category(), TypeCategory::Array);
        assert!(arr.category().is_complex());
    }

    #[test]
    fn simple_references_ranges() {
        let s = TypeDecl::Simple {
            name: "Speed".into(),
            type_name: "float32".into(),
            min_range: Some("0.0".into()),
            max_range: Some("%MaxSpeed%".into()),
            precision: None,
        };
        assert_eq!(
            s.references(),
            vec![TypeReference::Type("float32"), TypeReference::Literal("MaxSpeed")]
        );
    }

    #[test]
    fn variant_record_references_everything() {
        let v = TypeDecl::VariantRecord {
            name: "V".into(),
            select_name: "kind".into(),
            select_type: "Kind".into(),
            fields: vec![Field {
                name: "id".into(),
                type_name: "uint32".into(),
            }],
            unions: vec![Union {
                name: "pos".into(),
                type_name: "Position".into(),
                when: "POS".into(),
            }],
        };
        let names: Vec<_> = v.references().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Kind", "uint32", "Position"]);
    }

    #[test]
    fn deserialize_tagged() {
        let json = r#"{"category":"constant","name":"K","type":"int32","value":"5"}"#;
        let decl: TypeDecl = serde_json::from_str(json).unwrap();
        assert_eq!(decl.name(), "K");
        assert_eq!(decl.constant_value(), Some("5"));
        assert_eq!(decl.base_type(), Some("int32"));
    }

    #[test]
    fn category_mask_filtering() {
        let mask = CategoryMask::SIMPLE | CategoryMask::ENUM;
        assert!(mask.admits(TypeCategory::Enum));
        assert!(!mask.admits(TypeCategory::Record));
        assert!(CategoryMask::all().admits(TypeCategory::Constant));
    }
}
