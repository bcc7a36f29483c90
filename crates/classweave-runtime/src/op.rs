//! Instruction set of the reference backend.
//!
//! Bodies emitted through [`RuntimeEmitter`](crate::RuntimeEmitter) are
//! stored as flat [`Op`] lists and executed by a small operand-stack
//! interpreter. Branch targets are label ids during emission and are
//! rewritten to absolute positions when the member is finished.

use std::sync::Arc;

use classweave_core::{
    CallbackSlot, ConstructionError, DispatchError, MethodDescriptor, ParamType, TypeHash,
};

/// One interpreted instruction.
#[derive(Debug, Clone)]
pub(crate) enum Op {
    LoadThis,
    LoadArg(usize),
    LoadArgs,
    Dup,
    Dup2,
    Swap,
    Pop,
    Pop2,
    PushInt(i64),
    PushBool(bool),
    PushNull,
    PushMethod(Arc<MethodDescriptor>),
    GetField(Arc<str>),
    PutField(Arc<str>),
    GetStatic(Arc<str>),
    PutStatic(Arc<str>),
    CellLoad(CallbackSlot),
    CellStore(CallbackSlot),
    BundleGet,
    CheckCallbackCast(CallbackSlot),
    ListGet,
    CastParam(ParamType),
    InvokeSuperCtor { hash: TypeHash, argc: usize },
    NewInstanceSelf,
    InvokeCtorSelf { hash: TypeHash, argc: usize },
    InvokeSelf(Arc<MethodDescriptor>),
    InvokeStaticSelf(Arc<MethodDescriptor>),
    InvokeSuper(Arc<MethodDescriptor>),
    InvokeCallback { argc: usize },
    Jump(usize),
    JumpIfNull(usize),
    JumpIfNonNull(usize),
    JumpIfTrue(usize),
    JumpTable {
        keys: Vec<i64>,
        targets: Vec<usize>,
        default: usize,
    },
    CtorTable {
        cases: Vec<(Vec<ParamType>, usize)>,
        default: usize,
    },
    ThrowConstruction(ConstructionError),
    ThrowDispatch(DispatchError),
    Return,
}

impl Op {
    /// Rewrite label ids to absolute positions once all labels are bound.
    pub(crate) fn patch_labels(&mut self, resolve: &dyn Fn(usize) -> Option<usize>) -> bool {
        let patch = |target: &mut usize| -> bool {
            match resolve(*target) {
                Some(pc) => {
                    *target = pc;
                    true
                }
                None => false,
            }
        };
        match self {
            Op::Jump(t) | Op::JumpIfNull(t) | Op::JumpIfNonNull(t) | Op::JumpIfTrue(t) => patch(t),
            Op::JumpTable {
                targets, default, ..
            } => targets.iter_mut().all(&patch) && patch(default),
            Op::CtorTable { cases, default } => {
                cases.iter_mut().all(|(_, t)| patch(t)) && patch(default)
            }
            _ => true,
        }
    }
}
