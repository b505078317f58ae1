use fob_module_graph::ModuleId;

use super::{Binding, BindingResolver, ResolveOptions};
use crate::error::{HoistError, Result};
use crate::identifier::property_access;

impl BindingResolver<'_> {
    /// Resolve `path` of `module` and render it as source text.
    pub fn final_name(
        &mut self,
        module: &ModuleId,
        path: &[String],
        options: &ResolveOptions,
    ) -> Result<String> {
        let binding = self.resolve(module, path, options)?;
        self.render(&binding, options)
    }

    /// Render a binding as source text.
    ///
    /// A call through a property path loses its receiver unless the site
    /// asks to keep it; the callee is then wrapped so it is called without
    /// `this`.
    pub fn render(&self, binding: &Binding, options: &ResolveOptions) -> Result<String> {
        let reference = match binding {
            Binding::Raw {
                name, comment, ids, ..
            } => format!(
                "{name}{}{}",
                comment.as_deref().unwrap_or_default(),
                property_access(ids)
            ),
            Binding::Symbol {
                module, symbol, ids, ..
            } => {
                let name = self.names.internal_name(module, symbol).ok_or_else(|| {
                    HoistError::MissingInternalName {
                        module: module.clone(),
                        name: symbol.clone(),
                    }
                })?;
                format!("{name}{}", property_access(ids))
            }
        };

        if !binding.ids().is_empty() && options.as_call && !options.call_context {
            return Ok(match options.asi_safe {
                Some(true) => format!("(0,{reference})"),
                Some(false) => format!(";(0,{reference})"),
                None => format!("/*#__PURE__*/Object({reference})"),
            });
        }
        Ok(reference)
    }
}
