//! Guessing the declared type of the first identifier of a chain.

use std::sync::Arc;
use tracing::debug;

use super::context::{LexicalEnvironment, ResolutionContext};
use super::imports::StaticMember;

/// Which rule produced a guess; reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessSource {
    Constructor,
    ClassField,
    MethodLocal,
    LocalMethod,
    InheritedField,
    InheritedMethod,
    StaticImport,
    ClassName,
}

/// Infer the class an identifier refers to.
///
/// Rules are tried in order and the first match wins:
/// `new Type`, fields of the class body, locals and parameters of the
/// enclosing method, methods of the buffer, inherited fields, inherited
/// methods, static imports, and finally the identifier as a class name
/// (which yields a static context).
pub fn guess_type(identifier: &str, env: &LexicalEnvironment<'_>) -> ResolutionContext {
    let (context, source) = guess(identifier, env);
    debug!(
        identifier,
        class = ?context.fully_qualified_class,
        is_static = context.is_static,
        source = ?source,
        "guessed type"
    );
    context
}

fn guess(identifier: &str, env: &LexicalEnvironment<'_>) -> (ResolutionContext, GuessSource) {
    let identifier = identifier.trim();

    if let Some(class) = identifier.strip_prefix("new ") {
        let class = class.trim();
        let resolved = env
            .resolve_class(class)
            .unwrap_or_else(|| Arc::from(class));
        return (ResolutionContext::instance(resolved), GuessSource::Constructor);
    }

    if let Some(field) = env.class_fields().iter().find(|f| f.name.as_ref() == identifier) {
        return (
            ResolutionContext::instance(Arc::clone(&field.ty)),
            GuessSource::ClassField,
        );
    }

    if let Some(local) = env.method_locals().iter().find(|f| f.name.as_ref() == identifier) {
        return (
            ResolutionContext::instance(Arc::clone(&local.ty)),
            GuessSource::MethodLocal,
        );
    }

    if let Some(ret) = env
        .local_methods()
        .iter()
        .find(|m| m.name.as_ref() == identifier)
        .and_then(|m| m.return_type())
    {
        return (
            ResolutionContext::instance(Arc::clone(ret)),
            GuessSource::LocalMethod,
        );
    }

    if let Some(field) = env
        .inherited_fields()
        .into_iter()
        .find(|f| f.name.as_ref() == identifier)
    {
        return (
            ResolutionContext::instance(Arc::clone(&field.ty)),
            GuessSource::InheritedField,
        );
    }

    if let Some(ret) = env
        .inherited_methods()
        .into_iter()
        .find(|m| m.name.as_ref() == identifier)
        .and_then(|m| m.return_type())
    {
        return (
            ResolutionContext::instance(Arc::clone(ret)),
            GuessSource::InheritedMethod,
        );
    }

    match env.static_import(identifier) {
        Some(StaticMember::Field(field)) => {
            return (ResolutionContext::instance(field.ty), GuessSource::StaticImport);
        }
        Some(StaticMember::Method(method)) => {
            if let Some(ret) = method.signature.return_value {
                return (ResolutionContext::instance(ret), GuessSource::StaticImport);
            }
        }
        None => {}
    }

    let context = ResolutionContext {
        fully_qualified_class: env.resolve_class(identifier),
        is_static: true,
    };
    (context, GuessSource::ClassName)
}
