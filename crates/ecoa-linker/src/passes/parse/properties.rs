//! Module properties and their per-component values.
//!
//! A property typed with a constant is carried with the constant's
//! underlying type. Array properties also record their item type and size
//! bound; enum properties (and arrays of enums) record their labels so the
//! value checks need nothing else from the registry.

use ecoa_core::decl::{ModuleInstanceDecl, NamedValueDecl};
use ecoa_core::{ItemType, ModelError, Property, TypeCategory, TypeDecl};

use super::ParseCx;

fn property_values(instance: &ModuleInstanceDecl) -> &[NamedValueDecl] {
    &instance.property_values
}

pub(super) fn parse(cx: &mut ParseCx<'_, '_>) -> Result<usize, ModelError> {
    let mut count = 0;
    for site in cx.sites {
        for decl in &site.module_type.properties {
            let context = format!(
                "{}:{}:{}",
                site.scope.component_impl, site.scope.module_type, decl.name
            );
            let registry = &cx.model.registry;

            let (mut type_ref, mut category) = cx.typed(&decl.type_name, &context)?;
            if category == TypeCategory::Constant {
                type_ref = registry.underlying(&type_ref, &context)?;
                category = registry
                    .classify(&type_ref)
                    .ok_or_else(|| ModelError::unresolved_type(type_ref.to_string(), &context))?;
            }

            let declaration = registry.declaration(&type_ref);
            let item = match declaration.and_then(TypeDecl::item_type) {
                Some(item_name) => {
                    let item_ref = registry.resolve_from(item_name, &type_ref.namespace, &context)?;
                    let item_category = registry
                        .classify(&item_ref)
                        .ok_or_else(|| ModelError::unresolved_type(item_name, &context))?;
                    Some(ItemType {
                        type_ref: item_ref,
                        category: item_category,
                    })
                }
                None => None,
            };
            let labels_of = match &item {
                Some(item) if item.category == TypeCategory::Enum => {
                    registry.declaration(&item.type_ref)
                }
                _ => declaration,
            };
            let labels: Vec<String> = labels_of
                .and_then(TypeDecl::enum_values)
                .map(|values| values.iter().map(|v| v.name.clone()).collect())
                .unwrap_or_default();
            let max_number = declaration.and_then(TypeDecl::max_number).map(str::to_string);

            let values = cx.deployed_values(site, &decl.name, property_values)?;
            cx.model.properties.insert(
                site.scope.key(),
                Property {
                    scope: site.scope.clone(),
                    name: decl.name.clone(),
                    type_ref,
                    category,
                    item,
                    max_number,
                    labels,
                    values,
                },
            );
            count += 1;
        }
    }
    Ok(count)
}
