//! The reference emitter backend.
//!
//! [`RuntimeEmitter`] satisfies the abstract emission capability by
//! recording members as [`Op`] lists and finalizing them into a
//! [`SynthesizedClass`]. Instruction emission is infallible per the
//! contract, so misuse (emitting outside a member, an unresolved label)
//! poisons the emitter and surfaces as a backend error at `end_class`.

use std::sync::Arc;

use classweave_core::{
    CallbackSlot, ConstructionError, DispatchError, MethodDescriptor, Modifiers, ParamType,
    SynthesisError, TypeDescriptor, TypeHash,
};
use classweave_synth::ClassEmitter;
use rustc_hash::FxHashMap;

use crate::interp;
use crate::native::NativeClass;
use crate::op::Op;
use crate::synthesized::{EmittedMethod, SynthesizedClass};

enum MemberKind {
    Constructor(TypeHash),
    Method(Arc<MethodDescriptor>),
    StaticMethod(Arc<MethodDescriptor>),
    StaticInit,
}

struct Member {
    kind: MemberKind,
    ops: Vec<Op>,
    // label id -> bound position, None until marked
    labels: Vec<Option<usize>>,
}

/// Emits classes executed by the built-in interpreter.
///
/// One emitter produces one class; the native base supplies inherited
/// behavior and the super-constructor bodies.
pub struct RuntimeEmitter {
    base: Arc<NativeClass>,
    class_name: Option<Arc<str>>,
    interfaces: Vec<Arc<TypeDescriptor>>,
    fields: Vec<(Arc<str>, ParamType)>,
    static_fields: Vec<(Arc<str>, ParamType)>,
    cells: Vec<CallbackSlot>,
    methods: FxHashMap<TypeHash, EmittedMethod>,
    static_methods: FxHashMap<TypeHash, EmittedMethod>,
    constructors: FxHashMap<TypeHash, Vec<Op>>,
    static_init: Vec<Op>,
    member: Option<Member>,
    poison: Option<SynthesisError>,
}

impl RuntimeEmitter {
    /// An emitter extending the given native base.
    pub fn new(base: Arc<NativeClass>) -> Self {
        Self {
            base,
            class_name: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            static_fields: Vec::new(),
            cells: Vec::new(),
            methods: FxHashMap::default(),
            static_methods: FxHashMap::default(),
            constructors: FxHashMap::default(),
            static_init: Vec::new(),
            member: None,
            poison: None,
        }
    }

    fn poison(&mut self, detail: &str) {
        if self.poison.is_none() {
            self.poison = Some(SynthesisError::Backend {
                detail: detail.to_string(),
            });
        }
    }

    fn op(&mut self, op: Op) {
        match &mut self.member {
            Some(member) => member.ops.push(op),
            None => self.poison("instruction emitted outside a member body"),
        }
    }

    fn begin_member(&mut self, kind: MemberKind) {
        if self.member.is_some() {
            self.poison("member opened while another is still being emitted");
            return;
        }
        self.member = Some(Member {
            kind,
            ops: Vec::new(),
            labels: Vec::new(),
        });
    }
}

impl ClassEmitter for RuntimeEmitter {
    type Label = usize;
    type Output = Arc<SynthesizedClass>;

    fn begin_class(
        &mut self,
        _modifiers: Modifiers,
        name: &str,
        superclass: &Arc<TypeDescriptor>,
        interfaces: &[Arc<TypeDescriptor>],
    ) -> Result<(), SynthesisError> {
        if self.class_name.is_some() {
            return Err(SynthesisError::Backend {
                detail: "emitter already holds a class declaration".into(),
            });
        }
        if superclass.name != self.base.descriptor().name {
            return Err(SynthesisError::Backend {
                detail: format!(
                    "declared superclass {} does not match native base {}",
                    superclass.name,
                    self.base.descriptor().name
                ),
            });
        }
        self.class_name = Some(Arc::from(name));
        self.interfaces = interfaces.to_vec();
        Ok(())
    }

    fn end_class(mut self) -> Result<Self::Output, SynthesisError> {
        if self.member.is_some() {
            self.poison("class finalized with an unterminated member");
        }
        if let Some(error) = self.poison {
            return Err(error);
        }
        let name = self.class_name.ok_or_else(|| SynthesisError::Backend {
            detail: "class finalized before it was declared".into(),
        })?;
        let class = SynthesizedClass::assemble(
            name,
            self.base,
            self.interfaces,
            self.fields,
            self.static_fields,
            self.cells,
            self.methods,
            self.static_methods,
            self.constructors,
        );
        interp::run(&class, &self.static_init, None, &[]).map_err(|e| SynthesisError::Backend {
            detail: format!("static initialization failed: {e}"),
        })?;
        Ok(class)
    }

    fn declare_field(&mut self, modifiers: Modifiers, ty: ParamType, name: &str) {
        let entry = (Arc::from(name), ty);
        if modifiers.contains(Modifiers::STATIC) {
            self.static_fields.push(entry);
        } else {
            self.fields.push(entry);
        }
    }

    fn declare_transfer_cell(&mut self, slot: CallbackSlot, _name: &str) {
        if !self.cells.contains(&slot) {
            self.cells.push(slot);
        }
    }

    fn begin_constructor(&mut self, params: &[ParamType]) {
        self.begin_member(MemberKind::Constructor(TypeHash::from_constructor(params)));
    }

    fn begin_method(&mut self, modifiers: Modifiers, method: &MethodDescriptor) {
        let descriptor = Arc::new(method.clone());
        if modifiers.contains(Modifiers::STATIC) {
            self.begin_member(MemberKind::StaticMethod(descriptor));
        } else {
            self.begin_member(MemberKind::Method(descriptor));
        }
    }

    fn begin_static_init(&mut self) {
        self.begin_member(MemberKind::StaticInit);
    }

    fn end_member(&mut self) {
        let Some(member) = self.member.take() else {
            self.poison("member finished while none was being emitted");
            return;
        };
        let Member {
            kind,
            mut ops,
            labels,
        } = member;
        let resolve = |id: usize| labels.get(id).copied().flatten();
        if !ops.iter_mut().all(|op| op.patch_labels(&resolve)) {
            self.poison("branch to a label that was never bound");
            return;
        }
        match kind {
            MemberKind::Constructor(hash) => {
                self.constructors.insert(hash, ops);
            }
            MemberKind::Method(descriptor) => {
                self.methods.insert(
                    descriptor.hash_id(),
                    EmittedMethod {
                        descriptor,
                        body: ops,
                    },
                );
            }
            MemberKind::StaticMethod(descriptor) => {
                self.static_methods.insert(
                    descriptor.hash_id(),
                    EmittedMethod {
                        descriptor,
                        body: ops,
                    },
                );
            }
            MemberKind::StaticInit => self.static_init = ops,
        }
    }

    fn load_this(&mut self) {
        self.op(Op::LoadThis);
    }

    fn load_arg(&mut self, index: usize) {
        self.op(Op::LoadArg(index));
    }

    fn load_args(&mut self) {
        self.op(Op::LoadArgs);
    }

    fn dup(&mut self) {
        self.op(Op::Dup);
    }

    fn dup2(&mut self) {
        self.op(Op::Dup2);
    }

    fn swap(&mut self) {
        self.op(Op::Swap);
    }

    fn pop(&mut self) {
        self.op(Op::Pop);
    }

    fn pop2(&mut self) {
        self.op(Op::Pop2);
    }

    fn push_int(&mut self, value: i64) {
        self.op(Op::PushInt(value));
    }

    fn push_bool(&mut self, value: bool) {
        self.op(Op::PushBool(value));
    }

    fn push_null(&mut self) {
        self.op(Op::PushNull);
    }

    fn push_method(&mut self, method: &MethodDescriptor) {
        self.op(Op::PushMethod(Arc::new(method.clone())));
    }

    fn get_field(&mut self, name: &str) {
        self.op(Op::GetField(Arc::from(name)));
    }

    fn put_field(&mut self, name: &str) {
        self.op(Op::PutField(Arc::from(name)));
    }

    fn get_static(&mut self, name: &str) {
        self.op(Op::GetStatic(Arc::from(name)));
    }

    fn put_static(&mut self, name: &str) {
        self.op(Op::PutStatic(Arc::from(name)));
    }

    fn cell_load(&mut self, slot: CallbackSlot) {
        self.op(Op::CellLoad(slot));
    }

    fn cell_store(&mut self, slot: CallbackSlot) {
        self.op(Op::CellStore(slot));
    }

    fn bundle_get(&mut self) {
        self.op(Op::BundleGet);
    }

    fn invoke_super_constructor(&mut self, params: &[ParamType]) {
        self.op(Op::InvokeSuperCtor {
            hash: TypeHash::from_constructor(params),
            argc: params.len(),
        });
    }

    fn new_instance_self(&mut self) {
        self.op(Op::NewInstanceSelf);
    }

    fn invoke_constructor_self(&mut self, params: &[ParamType]) {
        self.op(Op::InvokeCtorSelf {
            hash: TypeHash::from_constructor(params),
            argc: params.len(),
        });
    }

    fn invoke_self(&mut self, method: &MethodDescriptor) {
        self.op(Op::InvokeSelf(Arc::new(method.clone())));
    }

    fn invoke_static_self(&mut self, method: &MethodDescriptor) {
        self.op(Op::InvokeStaticSelf(Arc::new(method.clone())));
    }

    fn invoke_super(&mut self, method: &MethodDescriptor) {
        self.op(Op::InvokeSuper(Arc::new(method.clone())));
    }

    fn invoke_callback(&mut self, argc: usize) {
        self.op(Op::InvokeCallback { argc });
    }

    fn check_callback_cast(&mut self, slot: CallbackSlot) {
        self.op(Op::CheckCallbackCast(slot));
    }

    fn make_label(&mut self) -> Self::Label {
        match &mut self.member {
            Some(member) => {
                member.labels.push(None);
                member.labels.len() - 1
            }
            None => {
                self.poison("label created outside a member body");
                0
            }
        }
    }

    fn mark(&mut self, label: Self::Label) {
        let Some(member) = &mut self.member else {
            self.poison("label bound outside a member body");
            return;
        };
        let position = member.ops.len();
        match member.labels.get_mut(label) {
            Some(slot @ None) => *slot = Some(position),
            Some(Some(_)) => self.poison("label bound twice"),
            None => self.poison("unknown label bound"),
        }
    }

    fn jump(&mut self, label: Self::Label) {
        self.op(Op::Jump(label));
    }

    fn jump_if_null(&mut self, label: Self::Label) {
        self.op(Op::JumpIfNull(label));
    }

    fn jump_if_non_null(&mut self, label: Self::Label) {
        self.op(Op::JumpIfNonNull(label));
    }

    fn jump_if_true(&mut self, label: Self::Label) {
        self.op(Op::JumpIfTrue(label));
    }

    fn jump_table(&mut self, keys: &[i64], targets: &[Self::Label], default: Self::Label) {
        self.op(Op::JumpTable {
            keys: keys.to_vec(),
            targets: targets.to_vec(),
            default,
        });
    }

    fn constructor_table(
        &mut self,
        cases: &[(Vec<ParamType>, Self::Label)],
        default: Self::Label,
    ) {
        self.op(Op::CtorTable {
            cases: cases.to_vec(),
            default,
        });
    }

    fn list_get(&mut self) {
        self.op(Op::ListGet);
    }

    fn cast_param(&mut self, ty: &ParamType) {
        self.op(Op::CastParam(ty.clone()));
    }

    fn throw_construction(&mut self, error: ConstructionError) {
        self.op(Op::ThrowConstruction(error));
    }

    fn throw_dispatch(&mut self, error: DispatchError) {
        self.op(Op::ThrowDispatch(error));
    }

    fn return_value(&mut self) {
        self.op(Op::Return);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classweave_core::Value;

    fn base() -> Arc<NativeClass> {
        let descriptor = TypeDescriptor::class("Base")
            .constructor(&[], Modifiers::PUBLIC)
            .build();
        NativeClass::builder(descriptor)
            .constructor(&[], |_instance, _args| Ok(()))
            .build()
    }

    fn declared(base: &Arc<NativeClass>) -> RuntimeEmitter {
        let mut emitter = RuntimeEmitter::new(base.clone());
        emitter
            .begin_class(Modifiers::PUBLIC, "Base$Woven", base.descriptor(), &[])
            .unwrap();
        emitter
    }

    #[test]
    fn superclass_mismatch_is_rejected() {
        let other = TypeDescriptor::class("Other").build();
        let mut emitter = RuntimeEmitter::new(base());
        let result = emitter.begin_class(Modifiers::PUBLIC, "X", &other, &[]);
        assert!(matches!(result, Err(SynthesisError::Backend { .. })));
    }

    #[test]
    fn branches_resolve_through_labels() {
        let base = base();
        let mut emitter = declared(&base);

        let pick = MethodDescriptor::new(
            "Base$Woven",
            "pick",
            &[ParamType::Bool],
            ParamType::Int,
            Modifiers::PUBLIC | Modifiers::STATIC,
        );
        emitter.begin_method(pick.modifiers, &pick);
        let when_true = emitter.make_label();
        emitter.load_arg(0);
        emitter.jump_if_true(when_true);
        emitter.push_int(1);
        emitter.return_value();
        emitter.mark(when_true);
        emitter.push_int(2);
        emitter.return_value();
        emitter.end_member();

        let class = emitter.end_class().unwrap();
        let one = class.invoke_static("pick", &[Value::Bool(false)]).unwrap();
        let two = class.invoke_static("pick", &[Value::Bool(true)]).unwrap();
        assert_eq!(one, Value::Int(1));
        assert_eq!(two, Value::Int(2));
    }

    #[test]
    fn unbound_label_poisons_the_emitter() {
        let base = base();
        let mut emitter = declared(&base);

        let broken = MethodDescriptor::new(
            "Base$Woven",
            "broken",
            &[],
            ParamType::Void,
            Modifiers::PUBLIC | Modifiers::STATIC,
        );
        emitter.begin_method(broken.modifiers, &broken);
        let nowhere = emitter.make_label();
        emitter.jump(nowhere);
        emitter.end_member();

        assert!(matches!(
            emitter.end_class(),
            Err(SynthesisError::Backend { .. })
        ));
    }

    #[test]
    fn static_fields_are_separated_from_instance_fields() {
        let base = base();
        let mut emitter = declared(&base);
        emitter.declare_field(Modifiers::PRIVATE, ParamType::Bool, "flag");
        emitter.declare_field(
            Modifiers::PRIVATE | Modifiers::STATIC,
            ParamType::Method,
            "speak_0",
        );
        let class = emitter.end_class().unwrap();
        assert!(class.has_field("flag"));
        assert!(!class.has_field("speak_0"));
        assert!(class.has_static("speak_0"));
    }
}
