//! Type-checking of expressions, statements, queries and operations against
//! a [`Context`].

use crate::context::Context;
use crate::env::TypeEnv;
use increq_ast::{BinOp, Exp, Operation, Query, Specification, Stm, Type, UnOp};
use increq_diagnostics::{DriverError, MethodLocation};

type R<T> = Result<T, DriverError>;

fn mismatch(at: &str, message: impl Into<String>) -> DriverError {
    DriverError::type_mismatch(message, MethodLocation::new(at))
}

/// Infer the type of `e` under `env`, resolving calls through `ctx`.
pub fn infer_exp(ctx: &Context, env: &mut TypeEnv, at: &str, e: &Exp) -> R<Type> {
    match e {
        Exp::Var(v) => match env.lookup(&v.name) {
            Some(ty) if *ty == v.ty => Ok(v.ty.clone()),
            Some(ty) => Err(mismatch(at, format!("variable '{}' declared as {} but used as {}", v.name, ty, v.ty))),
            None => Err(mismatch(at, format!("reference to unbound variable '{}'", v.name))),
        },
        Exp::Lit(l) => Ok(match l {
            increq_ast::Literal::Bool(_) => Type::Bool,
            increq_ast::Literal::Int(_) => Type::Int,
        }),
        Exp::Call(name, args) => {
            let sig = ctx.lookup_call(name).ok_or_else(|| ctx.unknown_call(name, at))?.clone();
            if sig.args.len() != args.len() {
                return Err(mismatch(at, format!("'{name}' expects {} arguments, found {}", sig.args.len(), args.len())));
            }
            for (arg, (pname, pty)) in args.iter().zip(&sig.args) {
                let aty = infer_exp(ctx, env, at, arg)?;
                if aty != *pty {
                    return Err(mismatch(at, format!("argument '{pname}' of '{name}': expected {pty}, found {aty}")));
                }
            }
            Ok(sig.ret)
        }
        Exp::Eq(a, b) => {
            let ta = infer_exp(ctx, env, at, a)?;
            let tb = infer_exp(ctx, env, at, b)?;
            if ta != tb {
                return Err(mismatch(at, format!("equality between {ta} and {tb}")));
            }
            Ok(Type::Bool)
        }
        Exp::And(xs) => {
            for x in xs {
                expect(ctx, env, at, x, &Type::Bool)?;
            }
            Ok(Type::Bool)
        }
        Exp::BinOp(op, a, b) => {
            let ta = infer_exp(ctx, env, at, a)?;
            let tb = infer_exp(ctx, env, at, b)?;
            match op {
                BinOp::Add | BinOp::Sub | BinOp::Mul => {
                    if ta != Type::Int || tb != Type::Int {
                        return Err(mismatch(at, format!("arithmetic on non-int operands {ta}, {tb}")));
                    }
                    Ok(Type::Int)
                }
                BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                    if ta != Type::Int || tb != Type::Int {
                        return Err(mismatch(at, format!("comparison on non-int operands {ta}, {tb}")));
                    }
                    Ok(Type::Bool)
                }
                BinOp::Or => {
                    if ta != Type::Bool || tb != Type::Bool {
                        return Err(mismatch(at, format!("'or' on non-bool operands {ta}, {tb}")));
                    }
                    Ok(Type::Bool)
                }
            }
        }
        Exp::UnOp(op, a) => match op {
            UnOp::Not => {
                expect(ctx, env, at, a, &Type::Bool)?;
                Ok(Type::Bool)
            }
            UnOp::Len => {
                let ta = infer_exp(ctx, env, at, a)?;
                if !ta.is_collection() {
                    return Err(mismatch(at, format!("'len' on non-collection type {ta}")));
                }
                Ok(Type::Int)
            }
        },
        Exp::In(elem, bag) => {
            let telem = infer_exp(ctx, env, at, elem)?;
            let tbag = infer_exp(ctx, env, at, bag)?;
            match tbag.elem_type() {
                Some(t) if *t == telem => Ok(Type::Bool),
                Some(t) => Err(mismatch(at, format!("'in' element type {telem} does not match collection element type {t}"))),
                None => Err(mismatch(at, format!("'in' on non-collection type {tbag}"))),
            }
        }
        Exp::Filter(bag, lambda) => {
            let tbag = infer_exp(ctx, env, at, bag)?;
            let telem = tbag.elem_type().cloned().ok_or_else(|| mismatch(at, format!("'filter' on non-collection type {tbag}")))?;
            if lambda.var.ty != telem {
                return Err(mismatch(at, "filter lambda's parameter type does not match the collection's element type"));
            }
            env.with_binding(&lambda.var.name, lambda.var.ty.clone(), |env| expect(ctx, env, at, &lambda.body, &Type::Bool))?;
            Ok(tbag)
        }
        Exp::MapColl(bag, lambda) => {
            let tbag = infer_exp(ctx, env, at, bag)?;
            let telem = tbag.elem_type().cloned().ok_or_else(|| mismatch(at, format!("'map' on non-collection type {tbag}")))?;
            if lambda.var.ty != telem {
                return Err(mismatch(at, "map lambda's parameter type does not match the collection's element type"));
            }
            let tout = env.with_binding(&lambda.var.name, lambda.var.ty.clone(), |env| infer_exp(ctx, env, at, &lambda.body))?;
            Ok(match tbag {
                Type::Set(_) => Type::bag(tout),
                Type::Bag(_) => Type::bag(tout),
                _ => unreachable!("elem_type() only returns Some for Bag/Set"),
            })
        }
        Exp::Distinct(a) => {
            let ta = infer_exp(ctx, env, at, a)?;
            let telem = ta.elem_type().cloned().ok_or_else(|| mismatch(at, format!("'distinct' on non-collection type {ta}")))?;
            Ok(Type::set(telem))
        }
        Exp::Sum(a) => {
            let ta = infer_exp(ctx, env, at, a)?;
            match ta.elem_type() {
                Some(Type::Int) => Ok(Type::Int),
                Some(t) => Err(mismatch(at, format!("'sum' over non-int elements {t}"))),
                None => Err(mismatch(at, format!("'sum' on non-collection type {ta}"))),
            }
        }
        Exp::Min(a) => {
            let ta = infer_exp(ctx, env, at, a)?;
            match ta.elem_type() {
                Some(Type::Int) => Ok(Type::Int),
                Some(t) => Err(mismatch(at, format!("'min' over non-int elements {t}"))),
                None => Err(mismatch(at, format!("'min' on non-collection type {ta}"))),
            }
        }
        Exp::GetField(a, field) => {
            let ta = infer_exp(ctx, env, at, a)?;
            let record_ty = match &ta {
                Type::Handle(h) => h.value_type.as_ref().clone(),
                other => other.clone(),
            };
            record_ty.field_type(field).cloned().ok_or_else(|| mismatch(at, format!("no field '{field}' on {record_ty}")))
        }
        Exp::MapGet(m, k) => {
            let tm = infer_exp(ctx, env, at, m)?;
            let (tk, tv) = match &tm {
                Type::Map(k, v) => (k.as_ref().clone(), v.as_ref().clone()),
                other => return Err(mismatch(at, format!("'get' on non-map type {other}"))),
            };
            expect(ctx, env, at, k, &tk)?;
            Ok(tv)
        }
        Exp::MapHas(m, k) => {
            let tm = infer_exp(ctx, env, at, m)?;
            let tk = match &tm {
                Type::Map(k, _) => k.as_ref().clone(),
                other => return Err(mismatch(at, format!("'has' on non-map type {other}"))),
            };
            expect(ctx, env, at, k, &tk)?;
            Ok(Type::Bool)
        }
        Exp::If(c, t, f) => {
            expect(ctx, env, at, c, &Type::Bool)?;
            let tt = infer_exp(ctx, env, at, t)?;
            let tf = infer_exp(ctx, env, at, f)?;
            if tt != tf {
                return Err(mismatch(at, format!("if-branches disagree: {tt} vs {tf}")));
            }
            Ok(tt)
        }
        Exp::Record(fields) => {
            let mut tys = Vec::with_capacity(fields.len());
            for (name, e) in fields {
                tys.push((name.clone(), infer_exp(ctx, env, at, e)?));
            }
            Ok(Type::Record(tys))
        }
        Exp::Lambda(_) => Err(mismatch(at, "a lambda may only appear as the argument to filter/map")),
        Exp::StateVar(inner) => infer_exp(ctx, env, at, inner),
    }
}

fn expect(ctx: &Context, env: &mut TypeEnv, at: &str, e: &Exp, want: &Type) -> R<()> {
    let got = infer_exp(ctx, env, at, e)?;
    if got != *want {
        return Err(mismatch(at, format!("expected {want}, found {got}")));
    }
    Ok(())
}

/// Type-check a statement. Statements have no result type of their own;
/// `Assign`'s lvalue and rvalue must agree, `ForEach`'s loop variable must
/// match the bag's element type, and so on.
pub fn check_stm(ctx: &Context, env: &mut TypeEnv, at: &str, s: &Stm) -> R<()> {
    match s {
        Stm::NoOp => Ok(()),
        Stm::Seq(a, b) => {
            check_stm(ctx, env, at, a)?;
            check_stm(ctx, env, at, b)
        }
        Stm::Decl(v, e) => {
            expect(ctx, env, at, e, &v.ty)?;
            env.define(v.name.clone(), v.ty.clone());
            Ok(())
        }
        Stm::Assign(lhs, rhs) => {
            let tl = infer_exp(ctx, env, at, lhs)?;
            expect(ctx, env, at, rhs, &tl)
        }
        Stm::If(c, a, b) => {
            expect(ctx, env, at, c, &Type::Bool)?;
            check_stm(ctx, env, at, a)?;
            check_stm(ctx, env, at, b)
        }
        Stm::ForEach(loop_var, bag, body) => {
            let tbag = infer_exp(ctx, env, at, bag)?;
            let telem = tbag.elem_type().cloned().ok_or_else(|| mismatch(at, format!("'for-each' over non-collection type {tbag}")))?;
            if loop_var.ty != telem {
                return Err(mismatch(at, "for-each loop variable type does not match the collection's element type"));
            }
            env.with_binding(&loop_var.name, loop_var.ty.clone(), |env| check_stm(ctx, env, at, body))
        }
        Stm::Call(target, name, args) => {
            let sig = ctx.lookup_call(name).ok_or_else(|| ctx.unknown_call(name, at))?.clone();
            infer_exp(ctx, env, at, target)?;
            if sig.args.len() != args.len() {
                return Err(mismatch(at, format!("'{name}' expects {} arguments, found {}", sig.args.len(), args.len())));
            }
            for (arg, (pname, pty)) in args.iter().zip(&sig.args) {
                let aty = infer_exp(ctx, env, at, arg)?;
                if aty != *pty {
                    return Err(mismatch(at, format!("argument '{pname}' of '{name}': expected {pty}, found {aty}")));
                }
            }
            Ok(())
        }
        Stm::MapPut(m, k, v) => {
            let tm = infer_exp(ctx, env, at, m)?;
            let (tk, tv) = match &tm {
                Type::Map(k, v) => (k.as_ref().clone(), v.as_ref().clone()),
                other => return Err(mismatch(at, format!("'put' on non-map type {other}"))),
            };
            expect(ctx, env, at, k, &tk)?;
            expect(ctx, env, at, v, &tv)
        }
        Stm::MapDel(m, k) => {
            let tm = infer_exp(ctx, env, at, m)?;
            let tk = match &tm {
                Type::Map(k, _) => k.as_ref().clone(),
                other => return Err(mismatch(at, format!("'del' on non-map type {other}"))),
            };
            expect(ctx, env, at, k, &tk)
        }
        Stm::MapUpdate(m, k, val_var, change) => {
            let tm = infer_exp(ctx, env, at, m)?;
            let (tk, tv) = match &tm {
                Type::Map(k, v) => (k.as_ref().clone(), v.as_ref().clone()),
                other => return Err(mismatch(at, format!("'update' on non-map type {other}"))),
            };
            expect(ctx, env, at, k, &tk)?;
            if val_var.ty != tv {
                return Err(mismatch(at, "map-update value variable type does not match the map's value type"));
            }
            env.with_binding(&val_var.name, val_var.ty.clone(), |env| check_stm(ctx, env, at, change))
        }
    }
}

/// Infer a query's return type without requiring it to already be in
/// `ctx.call_sigs` — used while [`Context::build`] is still constructing
/// itself one query at a time.
pub fn infer_query_ret_type(ctx: &Context, q: &Query) -> R<Type> {
    let mut env = TypeEnv::new();
    for (name, ty) in &q.args {
        env.define(name.clone(), ty.clone());
    }
    for a in &q.assumptions {
        expect(ctx, &mut env, &q.name, a, &Type::Bool)?;
    }
    infer_exp(ctx, &mut env, &q.name, &q.ret)
}

pub fn check_operation(ctx: &Context, op: &Operation) -> R<()> {
    let mut env = TypeEnv::new();
    for (name, ty) in &op.args {
        env.define(name.clone(), ty.clone());
    }
    for a in &op.assumptions {
        expect(ctx, &mut env, &op.name, a, &Type::Bool)?;
    }
    check_stm(ctx, &mut env, &op.name, &op.body)
}

/// Type-check every method in a specification, collecting all errors before
/// reporting (mirroring the teacher's habit of accumulating diagnostics
/// rather than failing on the first one).
pub fn check_specification(ctx: &Context, spec: &Specification) -> R<()> {
    let mut errors = Vec::new();
    for q in spec.queries() {
        if let Err(e) = infer_query_ret_type(ctx, q) {
            errors.push(e);
        }
    }
    for op in spec.operations() {
        if let Err(e) = check_operation(ctx, op) {
            errors.push(e);
        }
    }
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.into_iter().next().unwrap()),
        _ => Err(DriverError::Multiple(errors)),
    }
}
