use std::{fmt, sync::Arc};

use crate::{
    error::Result,
    types::{Mapped, TypeInfo},
    value::Value,
};

/// A record type the resolver can build a class map for.
///
/// `describe` lists the settable members in declaration order; the
/// [`mapped_record!`](crate::mapped_record) macro writes it for plain structs.
pub trait Record: Default + Send + 'static {
    fn describe(members: &mut Members<Self>);
}

pub(crate) type Assign<R> = Arc<dyn Fn(&mut R, Value) -> Result<()> + Send + Sync>;

pub(crate) struct MemberDecl<R> {
    pub(crate) name: &'static str,
    pub(crate) info: TypeInfo,
    pub(crate) assign: Assign<R>,
}

/// Member declarations collected from [`Record::describe`].
pub struct Members<R> {
    decls: Vec<MemberDecl<R>>,
}

impl<R: 'static> Members<R> {
    pub(crate) fn new() -> Self {
        Self { decls: Vec::new() }
    }

    /// Declares a member named `name` of type `T`, written through `setter`.
    pub fn member<T: Mapped>(&mut self, name: &'static str, setter: fn(&mut R, T)) -> &mut Self {
        let assign: Assign<R> = Arc::new(move |record: &mut R, value: Value| {
            setter(record, T::from_value(value)?);
            Ok(())
        });
        self.decls.push(MemberDecl {
            name,
            info: T::type_info(),
            assign,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decls.iter().map(|decl| decl.name)
    }

    pub(crate) fn into_decls(self) -> Vec<MemberDecl<R>> {
        self.decls
    }
}

impl<R> fmt::Debug for Members<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.decls.iter().map(|decl| (decl.name, decl.info.name)))
            .finish()
    }
}

/// Collects the member declarations of `R`.
pub fn describe_members<R: Record>() -> Members<R> {
    let mut members = Members::new();
    R::describe(&mut members);
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    #[derive(Default)]
    struct Sample {
        id: u32,
        label: Option<String>,
    }

    impl Record for Sample {
        fn describe(members: &mut Members<Self>) {
            members
                .member::<u32>("id", |sample, value| sample.id = value)
                .member::<Option<String>>("label", |sample, value| sample.label = value);
        }
    }

    #[test]
    fn members_keep_declaration_order_and_types() {
        let members = describe_members::<Sample>();
        assert_eq!(members.names().collect::<Vec<_>>(), vec!["id", "label"]);
        let decls = members.into_decls();
        assert!(matches!(decls[1].info.kind, TypeKind::Nullable(_)));
    }

    #[test]
    fn assign_converts_and_reports_mismatches() {
        let decls = describe_members::<Sample>().into_decls();
        let mut sample = Sample::default();
        (decls[0].assign)(&mut sample, Value::UInt(7)).unwrap();
        (decls[1].assign)(&mut sample, Value::String("x".to_string())).unwrap();
        assert_eq!(sample.id, 7);
        assert_eq!(sample.label.as_deref(), Some("x"));
        assert!((decls[0].assign)(&mut sample, Value::Bool(true)).is_err());
    }
}
