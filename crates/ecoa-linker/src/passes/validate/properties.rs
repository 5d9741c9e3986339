//! Property type and value checks.
//!
//! ## Types
//!
//! A property is Simple or Enum, or an Array / FixedArray whose items are
//! Simple or Enum. Anything else is [`ModelError::UnsupportedPropertyType`].
//!
//! ## Values
//!
//! ```text
//! Simple      no unknown symbol; %ns:Name% must name a declared constant
//! Enum        no unknown symbol; must be one of the enum labels
//! Array       [a, b, ...] (each item checked) or "..." (string literal)
//!             length <= maxNumber (Array) or == maxNumber (FixedArray)
//! ```
//!
//! An unknown symbol is a `#?(digit|*):` sequence, which only appears in
//! values copied from another tool's syntax.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, debug_span};

use ecoa_core::entity::string_array_length;
use ecoa_core::{ModelError, Property, TypeCategory, TypeDecl, literal_reference};
use ecoa_registry::TypeRegistry;

use crate::model::Model;

/// Checks every parsed property of the model.
pub struct PropertiesCheck<'m> {
    model: &'m Model,
}

/// Value locator: `component_impl:module_inst:property`.
struct ValueSite<'p> {
    property: &'p Property,
    locator: String,
}

impl<'m> PropertiesCheck<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self { model }
    }

    /// Returns the number of values checked.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> Result<usize, ModelError> {
        let span = debug_span!("check_properties");
        let _guard = span.enter();

        let mut checked = 0;
        for (_, property) in self.model.properties.iter() {
            self.check_type(property)?;
            for key in property.values.keys() {
                let instance = key.split(':').nth(1).unwrap_or_default();
                let site = ValueSite {
                    property,
                    locator: format!(
                        "{}:{}:{}",
                        property.scope.component_impl, instance, property.name
                    ),
                };
                self.check_value(&site, &property.values[key], property.category)?;
                checked += 1;
            }
        }
        debug!(properties = self.model.properties.len(), values = checked, "properties checked");
        Ok(checked)
    }

    fn check_type(&self, property: &Property) -> Result<(), ModelError> {
        let supported = match property.category {
            TypeCategory::Simple | TypeCategory::Enum => true,
            TypeCategory::Array | TypeCategory::FixedArray => property
                .item
                .as_ref()
                .is_some_and(|item| item.category.is_scalar()),
            TypeCategory::Record | TypeCategory::VariantRecord | TypeCategory::Constant => false,
        };
        if supported {
            return Ok(());
        }
        Err(ModelError::UnsupportedPropertyType {
            type_name: property.type_ref.to_string(),
            property: format!(
                "{}:{}:{}",
                property.scope.component_impl, property.scope.module_type, property.name
            ),
        })
    }

    fn check_value(
        &self,
        site: &ValueSite<'_>,
        value: &str,
        category: TypeCategory,
    ) -> Result<(), ModelError> {
        match category {
            TypeCategory::Array | TypeCategory::FixedArray => self.check_array(site, value.trim()),
            TypeCategory::Enum => {
                check_symbols(site, value)?;
                if site.property.labels.iter().any(|label| label == value) {
                    Ok(())
                } else {
                    Err(invalid(site, format!("Unknown enum value {value}")))
                }
            }
            TypeCategory::Simple => {
                check_symbols(site, value)?;
                match literal_reference(value) {
                    Some(reference) if self.model.registry.lookup(reference).is_none() => {
                        Err(invalid(site, format!("Unknown constant value {value}")))
                    }
                    _ => Ok(()),
                }
            }
            TypeCategory::Record | TypeCategory::VariantRecord | TypeCategory::Constant => Ok(()),
        }
    }

    fn check_array(&self, site: &ValueSite<'_>, value: &str) -> Result<(), ModelError> {
        let length = if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            let items: Vec<String> = inner.split(',').map(|item| item.replace(' ', "")).collect();
            let item_category = site
                .property
                .item
                .as_ref()
                .map_or(TypeCategory::Simple, |item| item.category);
            for item in &items {
                self.check_value(site, item, item_category)?;
            }
            items.len()
        } else if let Some(inner) = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
        {
            string_array_length(inner)
        } else {
            return Err(invalid(site, format!("Unsupported array value {value}")));
        };
        self.check_length(site, length)
    }

    fn check_length(&self, site: &ValueSite<'_>, length: usize) -> Result<(), ModelError> {
        let property = site.property;
        let bound = property.max_number.as_deref().unwrap_or_default().trim();
        let max = constant_number(&self.model.registry, bound, &property.type_ref.namespace)
            .ok_or_else(|| invalid(site, format!("Unknown constant value {bound}")))?;
        match property.category {
            TypeCategory::Array if length > max => Err(invalid(
                site,
                format!("Incorrect array length ({length}>{max})"),
            )),
            TypeCategory::FixedArray if length != max => Err(invalid(
                site,
                format!("Incorrect array length ({length}!={max})"),
            )),
            _ => Ok(()),
        }
    }
}

fn invalid(site: &ValueSite<'_>, reason: String) -> ModelError {
    ModelError::invalid_property_value(&site.locator, reason)
}

fn check_symbols(site: &ValueSite<'_>, value: &str) -> Result<(), ModelError> {
    match unknown_symbol(value) {
        Some(symbol) => Err(invalid(
            site,
            format!("Unknown symbol {symbol} in value {value}"),
        )),
        None => Ok(()),
    }
}

static UNKNOWN_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#?(\d|\*):").expect("unknown-symbol pattern compiles"));

/// First `#?(digit|*):` sequence of `value`. Digits are Unicode digits.
fn unknown_symbol(value: &str) -> Option<&str> {
    UNKNOWN_SYMBOL.find(value).map(|m| m.as_str())
}

/// Numeric value of a size bound: a literal, or a `%ns:Name%` constant
/// (followed through constants declared with another constant as value).
fn constant_number(registry: &TypeRegistry, bound: &str, namespace: &str) -> Option<usize> {
    let mut text = bound.to_string();
    for _ in 0..=registry.len() {
        if let Ok(number) = text.trim().parse() {
            return Some(number);
        }
        let reference = literal_reference(&text)?;
        let target = registry.resolve_from(reference, namespace, "").ok()?;
        text = registry
            .declaration(&target)
            .and_then(TypeDecl::constant_value)?
            .to_string();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoa_core::{EnumValue, ItemType, Language, ModuleScope, TypeRef};
    use ecoa_registry::DeploymentIndex;
    use indexmap::IndexMap;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register_library(
                "lib",
                &[
                    TypeDecl::Constant {
                        name: "N".into(),
                        type_name: "uint32".into(),
                        value: "3".into(),
                    },
                    TypeDecl::Enum {
                        name: "Mode".into(),
                        type_name: "uint32".into(),
                        values: vec![
                            EnumValue {
                                name: "ON".into(),
                                valnum: None,
                            },
                            EnumValue {
                                name: "OFF".into(),
                                valnum: None,
                            },
                        ],
                    },
                ],
            )
            .unwrap();
        registry
    }

    fn property(category: TypeCategory, item: Option<TypeCategory>, value: &str) -> Property {
        Property {
            scope: ModuleScope {
                component_impl: "Comp".into(),
                module_type: "Mod_t".into(),
                module_impl: "Mod_impl".into(),
                language: Language::C,
            },
            name: "p".into(),
            type_ref: TypeRef::new("lib", "T"),
            category,
            item: item.map(|category| ItemType {
                type_ref: TypeRef::standard("int32"),
                category,
            }),
            max_number: Some("%lib:N%".into()),
            labels: vec!["ON".into(), "OFF".into()],
            values: [("Comp:M1:A".to_string(), value.to_string())]
                .into_iter()
                .collect::<IndexMap<_, _>>(),
        }
    }

    fn check(property: Property) -> Result<usize, ModelError> {
        let mut model = Model::new(registry(), DeploymentIndex::default());
        model.properties.insert("Comp:Mod_impl", property);
        PropertiesCheck::new(&model).run()
    }

    fn reason(result: Result<usize, ModelError>) -> String {
        match result {
            Err(ModelError::InvalidPropertyValue { property, reason }) => {
                assert_eq!(property, "Comp:M1:p");
                reason
            }
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn scalar_values_accepted() {
        assert_eq!(check(property(TypeCategory::Simple, None, "12")).unwrap(), 1);
        assert!(check(property(TypeCategory::Simple, None, "%lib:N%")).is_ok());
        assert!(check(property(TypeCategory::Enum, None, "OFF")).is_ok());
    }

    #[test]
    fn record_type_unsupported() {
        let err = check(property(TypeCategory::Record, None, "x")).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnsupportedPropertyType {
                type_name: "lib:T".into(),
                property: "Comp:Mod_t:p".into(),
            }
        );
    }

    #[test]
    fn array_of_records_unsupported() {
        let result = check(property(TypeCategory::Array, Some(TypeCategory::Record), "[1]"));
        assert!(matches!(result, Err(ModelError::UnsupportedPropertyType { .. })));
    }

    #[test]
    fn array_length_bounded_by_constant() {
        assert!(check(property(TypeCategory::Array, Some(TypeCategory::Simple), "[1, 2]")).is_ok());
        let too_long = check(property(TypeCategory::Array, Some(TypeCategory::Simple), "[1,2,3,4]"));
        assert_eq!(reason(too_long), "Incorrect array length (4>3)");
    }

    #[test]
    fn fixed_array_length_must_match() {
        assert!(check(property(TypeCategory::FixedArray, Some(TypeCategory::Simple), "[1,2,3]")).is_ok());
        let short = check(property(TypeCategory::FixedArray, Some(TypeCategory::Simple), "\"a\""));
        assert_eq!(reason(short), "Incorrect array length (2!=3)");
    }

    #[test]
    fn array_enum_items_checked() {
        let bad = check(property(TypeCategory::Array, Some(TypeCategory::Enum), "[ON, DIM]"));
        assert_eq!(reason(bad), "Unknown enum value DIM");
    }

    #[test]
    fn unsupported_array_value() {
        let bad = check(property(TypeCategory::Array, Some(TypeCategory::Simple), "1,2"));
        assert_eq!(reason(bad), "Unsupported array value 1,2");
    }

    #[test]
    fn unknown_enum_label() {
        let bad = check(property(TypeCategory::Enum, None, "DIM"));
        assert_eq!(reason(bad), "Unknown enum value DIM");
    }

    #[test]
    fn unknown_constant_reference() {
        let bad = check(property(TypeCategory::Simple, None, "%lib:Missing%"));
        assert_eq!(reason(bad), "Unknown constant value %lib:Missing%");
    }

    #[test]
    fn unknown_symbol_rejected() {
        let bad = check(property(TypeCategory::Simple, None, "x#1:2"));
        assert_eq!(reason(bad), "Unknown symbol #1: in value x#1:2");
        assert_eq!(unknown_symbol("a*:b"), Some("*:"));
        assert_eq!(unknown_symbol("lib:K"), None);
        assert_eq!(unknown_symbol("x#7:y"), Some("#7:"));
        assert_eq!(unknown_symbol("\u{0663}:"), Some("\u{0663}:"));
        assert_eq!(unknown_symbol("\u{FF13}:"), Some("\u{FF13}:"));
    }
}
