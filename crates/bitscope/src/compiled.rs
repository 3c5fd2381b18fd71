//! Compiled form of type references and record field lists.

use std::sync::Arc;

use log::trace;

use crate::{
    context::Context,
    cursor::BitSource,
    errors::Error,
    field::{FieldList, TypeRef},
    frame::Frame,
    param::Param,
    registry::Registry,
    scoped::ScopedCursor,
    value::Value,
};

/// A ready-to-run decoding procedure for one type reference.
///
/// Names are checked when compiling but looked up in the registry only when
/// the procedure runs, which is what lets record types refer to each other
/// (and to themselves) in any order.
#[derive(Debug, Clone)]
pub(crate) enum Procedure {
    Lookup(String),
    /// `n`-bit integer through the registry's `int` decoder.
    Shorthand(u64),
    Call { head: Head, args: Vec<Param> },
    Record(Arc<CompiledRecord>),
}

#[derive(Debug, Clone)]
pub(crate) enum Head {
    Static(Box<Procedure>),
    /// Resolved against the context on every run.
    Dynamic(Param),
}

impl Procedure {
    pub(crate) fn compile(ty: &TypeRef, is_known: &dyn Fn(&str) -> bool) -> Result<Self, Error> {
        match ty {
            TypeRef::Named(name) if is_known(name) => Ok(Procedure::Lookup(name.clone())),
            TypeRef::Named(name) => Err(Error::UnknownType(name.clone())),
            TypeRef::Bits(bits) => Ok(Procedure::Shorthand(*bits)),
            TypeRef::Call { head, args } => {
                let head = if head.is_constant() {
                    let ty = head.resolve(&Context::new(None))?.into_type()?;
                    Head::Static(Box::new(Procedure::compile(&ty, is_known)?))
                } else {
                    Head::Dynamic((**head).clone())
                };

                Ok(Procedure::Call {
                    head,
                    args: args.clone(),
                })
            }
            TypeRef::Dynamic(derive) => Ok(Procedure::Call {
                head: Head::Dynamic(Param::Derived(derive.clone())),
                args: Vec::new(),
            }),
            TypeRef::Record(fields) => Ok(Procedure::Record(Arc::new(CompiledRecord::compile(
                fields, is_known,
            )?))),
        }
    }

    pub(crate) fn run(&self, frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
        frame.descend(|frame| self.run_nested(frame, args))
    }

    fn run_nested(&self, frame: &mut Frame<'_>, args: &[Param]) -> Result<Value, Error> {
        match self {
            Procedure::Lookup(name) => frame.call(name, args),
            Procedure::Shorthand(bits) => {
                let args: Vec<Param> = std::iter::once(Param::from(*bits))
                    .chain(args.iter().cloned())
                    .collect();
                frame.call("int", &args)
            }
            Procedure::Call { head, args: own } => {
                let joined;
                let args = if args.is_empty() {
                    own.as_slice()
                } else {
                    joined = own.iter().chain(args).cloned().collect::<Vec<_>>();
                    joined.as_slice()
                };

                match head {
                    Head::Static(procedure) => procedure.run(frame, args),
                    Head::Dynamic(param) => {
                        let ty = frame.resolve(param)?.into_type()?;
                        frame.compile(&ty)?.run(frame, args)
                    }
                }
            }
            Procedure::Record(record) => record.decode(frame, args.first()),
        }
    }
}

/// A record type's fields, each compiled to a [Procedure].
#[derive(Debug)]
pub(crate) struct CompiledRecord {
    fields: Vec<(String, Procedure)>,
}

impl CompiledRecord {
    pub(crate) fn compile(fields: &FieldList, is_known: &dyn Fn(&str) -> bool) -> Result<Self, Error> {
        let mut compiled = Vec::with_capacity(fields.len());
        for (name, ty) in fields.iter() {
            let procedure = Procedure::compile(ty, is_known).map_err(|error| error.in_field(name))?;
            compiled.push((name.to_string(), procedure));
        }

        Ok(CompiledRecord { fields: compiled })
    }

    /// Decodes one record. With a bit budget, the fields read through a
    /// [ScopedCursor] and the parent cursor advances by exactly the budget.
    pub(crate) fn decode(&self, frame: &mut Frame<'_>, budget: Option<&Param>) -> Result<Value, Error> {
        let bit_limit = frame.length(budget, "bit length")?;
        let registry = frame.registry;
        let levels = (frame.depth, frame.max_depth);
        let mut context = Context::new(frame.scope);

        match bit_limit {
            Some(bit_limit) => {
                let mut scoped = ScopedCursor::new(&mut *frame.cursor, bit_limit);
                self.decode_fields(registry, &mut context, &mut scoped, levels)?;
                scoped.skip_to_end()?;
            }
            None => self.decode_fields(registry, &mut context, &mut *frame.cursor, levels)?,
        }

        Ok(Value::Record(context.into_record()))
    }

    fn decode_fields(
        &self,
        registry: &Registry,
        context: &mut Context<'_>,
        cursor: &mut dyn BitSource,
        (depth, max_depth): (usize, usize),
    ) -> Result<(), Error> {
        for (name, procedure) in &self.fields {
            trace!("decoding field `{name}` at depth {depth}");

            let value = {
                let mut frame = Frame::nested(registry, &*context, &mut *cursor, depth, max_depth);
                procedure
                    .run(&mut frame, &[])
                    .map_err(|error| error.in_field(name))?
            };
            context.insert(name, value);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::BitCursor;

    fn known(name: &str) -> bool {
        matches!(name, "uint8" | "int")
    }

    #[test]
    fn test_compile_rejects_unknown_name() {
        let fields = FieldList::new().field("a", "uint8").field("b", "Missing");
        let error = CompiledRecord::compile(&fields, &known).unwrap_err();
        assert_eq!(error.path(), vec!["b"]);
        assert_eq!(error.cause(), &Error::UnknownType("Missing".to_string()));
    }

    #[test]
    fn test_compile_checks_static_call_head() {
        let ty = TypeRef::call("Missing", Vec::new());
        assert!(Procedure::compile(&ty, &known).is_err());

        let ty = TypeRef::call(Param::derived(|_| Ok("Missing".into())), Vec::new());
        assert!(Procedure::compile(&ty, &known).is_ok());
    }

    #[test]
    fn test_budgeted_record_advances_by_budget() {
        let registry = Registry::default();
        let record = CompiledRecord::compile(
            &FieldList::new().field("a", "uint8"),
            &|name| registry.contains(name),
        )
        .unwrap();

        let mut cursor = BitCursor::from_bytes([0x01, 0x02, 0x03, 0x04]);
        let value = {
            let mut frame = Frame::new(&registry, None, &mut cursor);
            record.decode(&mut frame, Some(&Param::from(24u64))).unwrap()
        };

        assert_eq!(value.get("a"), Some(&Value::Int(1)));
        assert_eq!(cursor.total_bits_left(), 8);
    }

    #[test]
    fn test_nested_records_count_towards_depth() {
        let registry = Registry::default();
        let inner = FieldList::new().field("a", "uint8");
        let ty = TypeRef::Record(FieldList::new().field("inner", inner));
        let procedure = Procedure::compile(&ty, &|name| registry.contains(name)).unwrap();

        // outer record, inner record, uint8
        let mut cursor = BitCursor::from_bytes([0x07]);
        let mut frame = Frame::new(&registry, None, &mut cursor).with_max_depth(3);
        let value = procedure.run(&mut frame, &[]).unwrap();
        assert_eq!(value.get("inner").and_then(|inner| inner.get("a")), Some(&Value::Int(7)));

        let mut cursor = BitCursor::from_bytes([0x07]);
        let mut frame = Frame::new(&registry, None, &mut cursor).with_max_depth(2);
        let error = procedure.run(&mut frame, &[]).unwrap_err();
        assert_eq!(error.cause(), &Error::DepthExceeded(2));
        assert_eq!(error.path(), vec!["inner", "a"]);
    }

    #[test]
    fn test_failed_record_releases_cursor() {
        let registry = Registry::default();
        let record = CompiledRecord::compile(
            &FieldList::new().field("a", "uint16"),
            &|name| registry.contains(name),
        )
        .unwrap();

        let mut cursor = BitCursor::from_bytes([0x01, 0x02]);
        {
            let mut frame = Frame::new(&registry, None, &mut cursor);
            let error = record.decode(&mut frame, Some(&Param::from(8u64))).unwrap_err();
            assert!(error.is_stream_exhausted());
            assert_eq!(error.path(), vec!["a"]);
        }

        // the root cursor is usable again and nothing was consumed
        assert_eq!(cursor.read_bits(16).unwrap(), 0x0102);
    }
}
