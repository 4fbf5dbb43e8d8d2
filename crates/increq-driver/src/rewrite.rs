//! Statement-level rewrites the driver needs that `increq-ast` doesn't
//! provide generically: redirecting calls to a deduplicated query, and
//! unpacking `StateVar`-marked subexpressions into a fresh representation.

use increq_ast::visit::rewrite_exp;
use increq_ast::{fresh_name, Exp, Stm, Var};
use increq_context::{infer_exp, Context, TypeEnv};
use increq_diagnostics::DriverError;

/// Redirects every call to `old_name` inside `s` to `new_name`, reordering
/// arguments by `perm` (`perm[i]` is the position in the new call that
/// receives the old call's `i`th argument).
pub fn rewrite_calls_stm(s: &Stm, old_name: &str, new_name: &str, perm: &[usize]) -> Stm {
    let rewrite_e = |e: &Exp| rewrite_calls_exp(e, old_name, new_name, perm);
    match s {
        Stm::NoOp => Stm::NoOp,
        Stm::Seq(a, b) => Stm::Seq(Box::new(rewrite_calls_stm(a, old_name, new_name, perm)), Box::new(rewrite_calls_stm(b, old_name, new_name, perm))),
        Stm::Decl(v, e) => Stm::Decl(v.clone(), rewrite_e(e)),
        Stm::Assign(lhs, rhs) => Stm::Assign(rewrite_e(lhs), rewrite_e(rhs)),
        Stm::If(c, t, e) => Stm::If(rewrite_e(c), Box::new(rewrite_calls_stm(t, old_name, new_name, perm)), Box::new(rewrite_calls_stm(e, old_name, new_name, perm))),
        Stm::ForEach(v, bag, body) => Stm::ForEach(v.clone(), rewrite_e(bag), Box::new(rewrite_calls_stm(body, old_name, new_name, perm))),
        Stm::Call(target, name, args) => {
            let target = rewrite_e(target);
            let args: Vec<Exp> = args.iter().map(rewrite_e).collect();
            if name == old_name {
                Stm::Call(target, new_name.to_string(), reorder(args, perm))
            } else {
                Stm::Call(target, name.clone(), args)
            }
        }
        Stm::MapPut(m, k, v) => Stm::MapPut(rewrite_e(m), rewrite_e(k), rewrite_e(v)),
        Stm::MapDel(m, k) => Stm::MapDel(rewrite_e(m), rewrite_e(k)),
        Stm::MapUpdate(m, k, v, change) => Stm::MapUpdate(rewrite_e(m), rewrite_e(k), v.clone(), Box::new(rewrite_calls_stm(change, old_name, new_name, perm))),
    }
}

pub fn rewrite_calls_exp(e: &Exp, old_name: &str, new_name: &str, perm: &[usize]) -> Exp {
    rewrite_exp(e.clone(), &mut |node| match node {
        Exp::Call(name, args) if name == old_name => Exp::Call(new_name.to_string(), reorder(args, perm)),
        other => other,
    })
}

fn reorder(args: Vec<Exp>, perm: &[usize]) -> Vec<Exp> {
    if perm.len() != args.len() {
        return args;
    }
    let mut out = args.clone();
    for (from, &to) in perm.iter().enumerate() {
        out[to] = args[from].clone();
    }
    out
}

/// Walks `e` bottom-up, turning every `StateVar`-marked subexpression into a
/// reference to a fresh concrete variable, and returns the collected
/// `(var, definition)` pairs alongside the rewritten expression. This is the
/// "unpack representation" step of §4.2 step 4: boundary repair marks the
/// subexpressions that are already available as concrete state, and this
/// turns those markers into representation-installer input.
pub fn unpack_representation(ctx: &Context, env: &mut TypeEnv, e: &Exp) -> Result<(Vec<(Var, Exp)>, Exp), DriverError> {
    let mut rep = Vec::new();
    let rewritten = unpack_node(ctx, env, e, &mut rep)?;
    Ok((rep, rewritten))
}

fn unpack_node(ctx: &Context, env: &mut TypeEnv, e: &Exp, rep: &mut Vec<(Var, Exp)>) -> Result<Exp, DriverError> {
    match e {
        Exp::StateVar(inner) => {
            let inner_rewritten = unpack_node(ctx, env, inner, rep)?;
            let ty = infer_exp(ctx, env, "representation", &inner_rewritten)?;
            let var = Var::new(fresh_name("rep"), ty);
            rep.push((var.clone(), inner_rewritten));
            Ok(Exp::var(var))
        }
        Exp::Var(_) | Exp::Lit(_) => Ok(e.clone()),
        Exp::Call(name, args) => {
            let args = args.iter().map(|a| unpack_node(ctx, env, a, rep)).collect::<Result<_, _>>()?;
            Ok(Exp::Call(name.clone(), args))
        }
        Exp::Eq(a, b) => Ok(Exp::eq(unpack_node(ctx, env, a, rep)?, unpack_node(ctx, env, b, rep)?)),
        Exp::And(xs) => Ok(Exp::And(xs.iter().map(|x| unpack_node(ctx, env, x, rep)).collect::<Result<_, _>>()?)),
        Exp::BinOp(op, a, b) => Ok(Exp::BinOp(*op, Box::new(unpack_node(ctx, env, a, rep)?), Box::new(unpack_node(ctx, env, b, rep)?))),
        Exp::UnOp(op, a) => Ok(Exp::UnOp(*op, Box::new(unpack_node(ctx, env, a, rep)?))),
        Exp::In(a, b) => Ok(Exp::in_bag(unpack_node(ctx, env, a, rep)?, unpack_node(ctx, env, b, rep)?)),
        Exp::Filter(bag, lambda) => {
            let bag = unpack_node(ctx, env, bag, rep)?;
            let var_ty = element_type_of(ctx, env, &bag)?;
            let body = env.with_binding(&lambda.var.name, var_ty, |env| unpack_node(ctx, env, &lambda.body, rep))?;
            Ok(Exp::filter(bag, increq_ast::Lambda { var: lambda.var.clone(), body }))
        }
        Exp::MapColl(bag, lambda) => {
            let bag = unpack_node(ctx, env, bag, rep)?;
            let var_ty = element_type_of(ctx, env, &bag)?;
            let body = env.with_binding(&lambda.var.name, var_ty, |env| unpack_node(ctx, env, &lambda.body, rep))?;
            Ok(Exp::map_coll(bag, increq_ast::Lambda { var: lambda.var.clone(), body }))
        }
        Exp::Distinct(a) => Ok(Exp::distinct(unpack_node(ctx, env, a, rep)?)),
        Exp::Sum(a) => Ok(Exp::sum(unpack_node(ctx, env, a, rep)?)),
        Exp::Min(a) => Ok(Exp::min(unpack_node(ctx, env, a, rep)?)),
        Exp::GetField(a, field) => Ok(Exp::get_field(unpack_node(ctx, env, a, rep)?, field.clone())),
        Exp::MapGet(a, b) => Ok(Exp::map_get(unpack_node(ctx, env, a, rep)?, unpack_node(ctx, env, b, rep)?)),
        Exp::MapHas(a, b) => Ok(Exp::map_has(unpack_node(ctx, env, a, rep)?, unpack_node(ctx, env, b, rep)?)),
        Exp::If(c, t, f) => Ok(Exp::if_then_else(unpack_node(ctx, env, c, rep)?, unpack_node(ctx, env, t, rep)?, unpack_node(ctx, env, f, rep)?)),
        Exp::Record(fields) => {
            let fields = fields.iter().map(|(n, v)| Ok((n.clone(), unpack_node(ctx, env, v, rep)?))).collect::<Result<_, DriverError>>()?;
            Ok(Exp::Record(fields))
        }
        Exp::Lambda(_) => Ok(e.clone()),
    }
}

fn element_type_of(ctx: &Context, env: &mut TypeEnv, bag: &Exp) -> Result<increq_ast::Type, DriverError> {
    let ty = infer_exp(ctx, env, "representation", bag)?;
    ty.elem_type().cloned().ok_or_else(|| DriverError::type_mismatch(format!("{ty:?} is not a collection"), increq_diagnostics::MethodLocation::new("representation")))
}
