//! Persistent-info handles and their file paths.

use ecoa_core::decl::{ModuleInstanceDecl, NamedValueDecl, PinfoDecl};
use ecoa_core::{ModelError, Pinfo};

use super::{ModuleSite, ParseCx};

fn pinfo_values(instance: &ModuleInstanceDecl) -> &[NamedValueDecl] {
    &instance.pinfo_values
}

pub(super) fn parse(cx: &mut ParseCx<'_, '_>) -> Result<usize, ModelError> {
    let mut count = 0;
    for site in cx.sites {
        for decl in &site.module_type.public_pinfos {
            build(cx, site, decl, false)?;
            count += 1;
        }
        for decl in &site.module_type.private_pinfos {
            build(cx, site, decl, true)?;
            count += 1;
        }
    }
    Ok(count)
}

fn build(
    cx: &mut ParseCx<'_, '_>,
    site: &ModuleSite<'_>,
    decl: &PinfoDecl,
    is_private: bool,
) -> Result<(), ModelError> {
    let values = cx
        .deployed_values(site, &decl.name, pinfo_values)?
        .into_iter()
        .map(|(key, value)| {
            let path = cx
                .layout
                .pinfo_path(&cx.component.directory, &value, is_private);
            (key, path)
        })
        .collect();
    cx.model.pinfos.insert(
        site.scope.key(),
        Pinfo {
            scope: site.scope.clone(),
            name: decl.name.clone(),
            is_private,
            values,
        },
    );
    Ok(())
}
