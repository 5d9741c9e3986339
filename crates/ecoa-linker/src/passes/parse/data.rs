//! Versioned-data entities.

use indexmap::IndexMap;

use ecoa_core::{DataRead, DataWritten, LinkMap, ModelError};

use super::{LinkIndex, ParseCx, locator};

pub(super) fn parse(cx: &mut ParseCx<'_, '_>) -> Result<usize, ModelError> {
    let mut count = 0;
    for site in cx.sites {
        let group = site.scope.key();
        for decl in &site.module_type.operations.data_read {
            let (type_ref, category) =
                cx.typed(&decl.type_name, &locator(&site.scope, &decl.name))?;
            let links = LinkIndex::select(&cx.links.data_readers, &site.instances, &decl.name);
            cx.model.data_read.insert(
                group.clone(),
                DataRead {
                    scope: site.scope.clone(),
                    name: decl.name.clone(),
                    type_ref,
                    category,
                    max_versions: decl.max_versions,
                    notifying: decl.notifying,
                    links,
                    controlled: IndexMap::new(),
                },
            );
            count += 1;
        }
        for decl in &site.module_type.operations.data_written {
            let (type_ref, category) =
                cx.typed(&decl.type_name, &locator(&site.scope, &decl.name))?;
            let links = LinkIndex::select(&cx.links.data_writers, &site.instances, &decl.name);
            let siblings: LinkMap = links
                .keys()
                .map(|writer| (writer.clone(), cx.links.siblings(writer)))
                .collect();
            cx.model.data_written.insert(
                group.clone(),
                DataWritten {
                    scope: site.scope.clone(),
                    name: decl.name.clone(),
                    type_ref,
                    category,
                    max_versions: decl.max_versions,
                    write_only: decl.write_only,
                    links,
                    siblings,
                    controlled: IndexMap::new(),
                },
            );
            count += 1;
        }
    }
    Ok(count)
}
