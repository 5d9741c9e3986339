//! Per-module services and used libraries.

use ecoa_core::type_ref::normalize_namespace;
use ecoa_core::{Log, Time};

use super::ParseCx;

/// Register the `Log` and `Time` services of every module implementation
/// and the libraries the component uses. Returns the number of modules.
pub(super) fn parse(cx: &mut ParseCx<'_, '_>) -> usize {
    for site in cx.sites {
        let key = site.scope.key();
        cx.model.logs.insert(
            key.clone(),
            Log {
                scope: site.scope.clone(),
            },
        );
        cx.model.times.insert(
            key,
            Time {
                scope: site.scope.clone(),
            },
        );
    }

    let uses = cx.model.uses.entry(cx.component.name.clone()).or_default();
    for library in &cx.component.uses {
        let library = normalize_namespace(library);
        if !uses.contains(&library) {
            uses.push(library);
        }
    }

    cx.sites.len()
}
