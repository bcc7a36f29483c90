//! Operand-stack interpreter for emitted bodies.
//!
//! Bodies are straight-line [`Op`] lists with absolute branch targets
//! (labels are resolved when a member is finished). Calls recurse through
//! [`run`]; native base behavior is invoked directly. Invoke instructions
//! push a result only when the callee's declared return type is non-void;
//! handler invocations always push, because a handler always produces a
//! value.

use classweave_core::{
    CallbackSlot, ConstructionError, DispatchError, MethodDescriptor, ParamType, Value, WeaveError,
};

use crate::instance::Instance;
use crate::op::Op;
use crate::synthesized::SynthesizedClass;

/// Execute one emitted body.
pub(crate) fn run(
    class: &SynthesizedClass,
    body: &[Op],
    this: Option<&Instance>,
    args: &[Value],
) -> Result<Value, WeaveError> {
    let mut stack: Vec<Value> = Vec::with_capacity(8);
    let mut pc = 0usize;

    while pc < body.len() {
        let op = &body[pc];
        pc += 1;
        match op {
            Op::LoadThis => {
                let this = this.ok_or_else(|| internal("load of `this` in a static body"))?;
                stack.push(this.as_value());
            }
            Op::LoadArg(index) => {
                let value = args
                    .get(*index)
                    .ok_or_else(|| internal("argument index out of range"))?;
                stack.push(value.clone());
            }
            Op::LoadArgs => stack.extend(args.iter().cloned()),
            Op::Dup => {
                let top = peek(&stack)?.clone();
                stack.push(top);
            }
            Op::Dup2 => {
                if stack.len() < 2 {
                    return Err(internal("dup2 on a short stack"));
                }
                let b = stack[stack.len() - 1].clone();
                let a = stack[stack.len() - 2].clone();
                stack.push(a);
                stack.push(b);
            }
            Op::Swap => {
                let len = stack.len();
                if len < 2 {
                    return Err(internal("swap on a short stack"));
                }
                stack.swap(len - 1, len - 2);
            }
            Op::Pop => {
                pop(&mut stack)?;
            }
            Op::Pop2 => {
                pop(&mut stack)?;
                pop(&mut stack)?;
            }
            Op::PushInt(v) => stack.push(Value::Int(*v)),
            Op::PushBool(v) => stack.push(Value::Bool(*v)),
            Op::PushNull => stack.push(Value::Null),
            Op::PushMethod(m) => stack.push(Value::Method(m.clone())),

            Op::GetField(name) => {
                let object = pop(&mut stack)?;
                let instance = expect_instance(&object)?;
                stack.push(instance.field(name)?);
            }
            Op::PutField(name) => {
                let value = pop(&mut stack)?;
                let object = pop(&mut stack)?;
                expect_instance(&object)?.set_field(name, value)?;
            }
            Op::GetStatic(name) => {
                let value = class
                    .static_value(name)
                    .ok_or_else(|| internal("read of an undeclared static field"))?;
                stack.push(value);
            }
            Op::PutStatic(name) => {
                let value = pop(&mut stack)?;
                if !class.set_static(name, value) {
                    return Err(internal("write to an undeclared static field"));
                }
            }
            Op::CellLoad(slot) => {
                let cell = cell(class, *slot)?;
                stack.push(cell.load());
            }
            Op::CellStore(slot) => {
                let value = pop(&mut stack)?;
                cell(class, *slot)?.store(value);
            }

            Op::BundleGet => {
                let slot = expect_slot(pop(&mut stack)?)?;
                let handler = match pop(&mut stack)? {
                    Value::Bundle(bundle) => bundle
                        .get(slot)
                        .map(|h| Value::Callback(h.clone()))
                        .unwrap_or(Value::Null),
                    other => return Err(mismatch("bundle", &other)),
                };
                stack.push(handler);
            }
            Op::CheckCallbackCast(slot) => match peek(&stack)? {
                Value::Null | Value::Callback(_) => {}
                other => return Err(mismatch(&format!("callback for {slot}"), other)),
            },
            Op::ListGet => {
                let index = expect_int(pop(&mut stack)?)? as usize;
                let element = match pop(&mut stack)? {
                    Value::ValueList(values) => values
                        .get(index)
                        .cloned()
                        .ok_or_else(|| internal("value list index out of range"))?,
                    other => return Err(mismatch("valuelist", &other)),
                };
                stack.push(element);
            }
            Op::CastParam(ty) => {
                let value = peek(&stack)?;
                if !value.matches(ty) {
                    return Err(mismatch(&ty.to_string(), value));
                }
            }

            Op::InvokeSuperCtor { hash, argc } => {
                let call_args = pop_args(&mut stack, *argc)?;
                let receiver = expect_instance(&pop(&mut stack)?)?;
                let ctor = class.base().find_constructor(*hash).ok_or_else(|| {
                    WeaveError::from(ConstructionError::ConstructorNotFound {
                        class: class.base().descriptor().name.to_string(),
                    })
                })?;
                ctor(&receiver, &call_args)?;
            }
            Op::NewInstanceSelf => {
                stack.push(Instance::new_uninit(&class.shared()).as_value());
            }
            Op::InvokeCtorSelf { hash, argc } => {
                let call_args = pop_args(&mut stack, *argc)?;
                let receiver = expect_instance(&pop(&mut stack)?)?;
                let body = class.find_constructor(*hash).ok_or_else(|| {
                    WeaveError::from(ConstructionError::ConstructorNotFound {
                        class: class.name().to_string(),
                    })
                })?;
                run(class, body, Some(&receiver), &call_args)?;
            }
            Op::InvokeSelf(method) => {
                let call_args = pop_args(&mut stack, method.params.len())?;
                let receiver = expect_instance(&pop(&mut stack)?)?;
                let result = invoke_virtual(&receiver, method, &call_args)?;
                if method.return_type != ParamType::Void {
                    stack.push(result);
                }
            }
            Op::InvokeStaticSelf(method) => {
                let call_args = pop_args(&mut stack, method.params.len())?;
                let result = class.invoke_static(&method.name, &call_args)?;
                if method.return_type != ParamType::Void {
                    stack.push(result);
                }
            }
            Op::InvokeSuper(method) => {
                let call_args = pop_args(&mut stack, method.params.len())?;
                let receiver = expect_instance(&pop(&mut stack)?)?;
                let native = class.base().find_method(method.hash_id()).ok_or_else(|| {
                    WeaveError::from(DispatchError::NoHandler {
                        method: method.to_string(),
                    })
                })?;
                let result = (native.body)(&receiver, &call_args)?;
                if method.return_type != ParamType::Void {
                    stack.push(result);
                }
            }
            Op::InvokeCallback { argc } => {
                let call_args = pop_args(&mut stack, *argc)?;
                let method = match pop(&mut stack)? {
                    Value::Method(m) => m,
                    other => return Err(mismatch("method", &other)),
                };
                let target = pop(&mut stack)?;
                let handler = match pop(&mut stack)? {
                    Value::Callback(h) => h,
                    other => return Err(mismatch("callback", &other)),
                };
                let result = handler.invoke(classweave_core::Invocation {
                    target: &target,
                    method: &method,
                    args: &call_args,
                })?;
                stack.push(result);
            }

            Op::Jump(target) => pc = *target,
            Op::JumpIfNull(target) => {
                if pop(&mut stack)?.is_null() {
                    pc = *target;
                }
            }
            Op::JumpIfNonNull(target) => {
                if !pop(&mut stack)?.is_null() {
                    pc = *target;
                }
            }
            Op::JumpIfTrue(target) => {
                let flag = pop(&mut stack)?
                    .as_bool()
                    .ok_or_else(|| internal("boolean branch on a non-boolean"))?;
                if flag {
                    pc = *target;
                }
            }
            Op::JumpTable {
                keys,
                targets,
                default,
            } => {
                let key = expect_int(pop(&mut stack)?)?;
                pc = keys
                    .iter()
                    .position(|k| *k == key)
                    .map(|i| targets[i])
                    .unwrap_or(*default);
            }
            Op::CtorTable { cases, default } => {
                let types = match pop(&mut stack)? {
                    Value::TypeList(t) => t,
                    other => return Err(mismatch("typelist", &other)),
                };
                pc = cases
                    .iter()
                    .find(|(params, _)| params == &*types)
                    .map(|(_, target)| *target)
                    .unwrap_or(*default);
            }
            Op::ThrowConstruction(e) => return Err(e.clone().into()),
            Op::ThrowDispatch(e) => return Err(e.clone().into()),
            Op::Return => return Ok(stack.pop().unwrap_or(Value::Null)),
        }
    }
    Ok(Value::Null)
}

/// Virtual dispatch by identity hash: the emitted override wins over the
/// native base chain.
fn invoke_virtual(
    receiver: &Instance,
    method: &MethodDescriptor,
    args: &[Value],
) -> Result<Value, WeaveError> {
    let class = receiver.class().clone();
    if let Some(emitted) = class.find_method(method.hash_id()) {
        return run(&class, &emitted.body, Some(receiver), args);
    }
    if let Some(native) = class.base().find_method(method.hash_id()) {
        return (native.body)(receiver, args);
    }
    Err(DispatchError::MethodNotFound {
        method: method.to_string(),
    }
    .into())
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, WeaveError> {
    stack.pop().ok_or_else(|| internal("operand stack underflow"))
}

fn peek(stack: &[Value]) -> Result<&Value, WeaveError> {
    stack.last().ok_or_else(|| internal("operand stack underflow"))
}

/// Pop `argc` values pushed left to right.
fn pop_args(stack: &mut Vec<Value>, argc: usize) -> Result<Vec<Value>, WeaveError> {
    if stack.len() < argc {
        return Err(internal("operand stack underflow"));
    }
    Ok(stack.split_off(stack.len() - argc))
}

fn expect_instance(value: &Value) -> Result<Instance, WeaveError> {
    Instance::from_value(value).ok_or_else(|| mismatch("object", value))
}

fn expect_int(value: Value) -> Result<i64, WeaveError> {
    value.as_int().ok_or_else(|| mismatch("int", &value))
}

fn expect_slot(value: Value) -> Result<CallbackSlot, WeaveError> {
    let raw = expect_int(value)?;
    u32::try_from(raw)
        .ok()
        .and_then(CallbackSlot::new)
        .ok_or_else(|| internal("slot constant out of range"))
}

fn cell(
    class: &SynthesizedClass,
    slot: CallbackSlot,
) -> Result<&crate::synthesized::TransferCell, WeaveError> {
    class
        .cell(slot)
        .ok_or_else(|| internal("transfer cell access on an undeclared slot"))
}

fn internal(detail: &str) -> WeaveError {
    DispatchError::Internal {
        detail: detail.to_string(),
    }
    .into()
}

fn mismatch(expected: &str, found: &Value) -> WeaveError {
    DispatchError::TypeMismatch {
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
    .into()
}
