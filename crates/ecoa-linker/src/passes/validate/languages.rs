//! Implementation language check.

use tracing::debug;

use ecoa_core::decl::ComponentImplDecl;
use ecoa_core::{Language, ModelError};

/// Every module implementation must be written in C or C++.
pub struct LanguagesCheck<'d> {
    components: &'d [ComponentImplDecl],
}

impl<'d> LanguagesCheck<'d> {
    pub fn new(components: &'d [ComponentImplDecl]) -> Self {
        Self { components }
    }

    /// Returns the number of module implementations checked.
    pub fn run(self) -> Result<usize, ModelError> {
        let mut checked = 0;
        for component in self.components {
            for implementation in &component.module_implementations {
                if Language::parse(&implementation.language).is_none() {
                    return Err(ModelError::unsupported_language(
                        &implementation.language,
                        format!("{}:{}", component.name, implementation.name),
                    ));
                }
                checked += 1;
            }
        }
        debug!(modules = checked, "implementation languages checked");
        Ok(checked)
    }
}
