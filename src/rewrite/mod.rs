//! Tree rewriting.
//!
//! A [`Shuttle`] decides, node by node, whether to replace what it sees.
//! [`walk`] drives it over the whole tree and rebuilds only the path from
//! the root to each replaced node: a subtree in which nothing changed comes
//! back borrowed, so unchanged input is never copied and never mutated.
//!
//! Decisions are pre-order (a call is offered to the shuttle before its
//! operands are visited); substitution is bottom-up (a parent is rebuilt
//! from its already rewritten children). A replacement returned by the
//! shuttle is final and is not walked again.

mod hive;

pub use hive::HiveRewriter;

use std::borrow::Cow;

use crate::schema::StructuralType;
use crate::sql::ast::{
    Call, Case, FrameBound, Join, JoinCondition, Node, OrderBy, OrderItem, Select, TypeSpec,
    Window, WindowFrame, With, WithItem,
};
use crate::sql::dialect::Dialect;
use crate::udf::ConversionError;

/// Per-node rewrite decisions.
pub trait Shuttle {
    type Error;

    /// Offered every call before its operands are visited.
    ///
    /// Returning a node replaces the call; the shuttle is then responsible
    /// for having rewritten any operands it kept.
    fn visit_call(&self, call: &Call) -> Result<Option<Node>, Self::Error> {
        let _ = call;
        Ok(None)
    }

    fn visit_type_spec(&self, spec: &TypeSpec) -> Result<Option<TypeSpec>, Self::Error> {
        let _ = spec;
        Ok(None)
    }
}

/// What conversion strategies see of the pass that invoked them.
pub trait RewriteContext {
    fn target(&self) -> Dialect;

    /// Rewrite `node` with the enclosing pass.
    fn rewrite(&self, node: &Node) -> Result<Node, ConversionError>;

    /// Type the validator inferred for `node`, when known.
    fn type_of(&self, node: &Node) -> Option<&StructuralType>;
}

/// Rewrite `node`, returning an owned tree.
pub fn rewrite<S: Shuttle + ?Sized>(shuttle: &S, node: &Node) -> Result<Node, S::Error> {
    walk(shuttle, node).map(Cow::into_owned)
}

/// Rewrite `node`, borrowing it back when nothing changed.
pub fn walk<'a, S: Shuttle + ?Sized>(
    shuttle: &S,
    node: &'a Node,
) -> Result<Cow<'a, Node>, S::Error> {
    let rebuilt = match node {
        Node::Identifier(_) | Node::Literal(_) | Node::IntervalQualifier(_) => None,
        Node::TypeSpec(spec) => shuttle.visit_type_spec(spec)?.map(Node::TypeSpec),
        Node::Call(call) => match shuttle.visit_call(call)? {
            Some(replacement) => Some(replacement),
            None => owned(walk_all(shuttle, &call.operands)?)
                .map(|operands| Node::Call(call.with_operands(operands))),
        },
        Node::NodeList(items) => owned(walk_all(shuttle, items)?).map(Node::NodeList),
        Node::Select(select) => walk_select(shuttle, select)?.map(Node::from),
        Node::Join(join) => walk_join(shuttle, join)?.map(Node::from),
        Node::With(with) => walk_with(shuttle, with)?.map(|w| Node::With(Box::new(w))),
        Node::OrderBy(order_by) => {
            walk_order_by(shuttle, order_by)?.map(|o| Node::OrderBy(Box::new(o)))
        }
        Node::Case(case) => walk_case(shuttle, case)?.map(|c| Node::Case(Box::new(c))),
        Node::Window(window) => walk_window(shuttle, window)?.map(|w| Node::Window(Box::new(w))),
    };
    Ok(match rebuilt {
        Some(node) => Cow::Owned(node),
        None => Cow::Borrowed(node),
    })
}

fn owned<T: ToOwned + ?Sized>(cow: Cow<'_, T>) -> Option<T::Owned> {
    match cow {
        Cow::Borrowed(_) => None,
        Cow::Owned(value) => Some(value),
    }
}

fn changed<T: ToOwned + ?Sized>(cow: &Cow<'_, T>) -> bool {
    matches!(cow, Cow::Owned(_))
}

fn walk_all<'a, S: Shuttle + ?Sized>(
    shuttle: &S,
    nodes: &'a [Node],
) -> Result<Cow<'a, [Node]>, S::Error> {
    let mut out: Option<Vec<Node>> = None;
    for (i, node) in nodes.iter().enumerate() {
        match (walk(shuttle, node)?, out.as_mut()) {
            (Cow::Borrowed(node), Some(out)) => out.push(node.clone()),
            (Cow::Borrowed(_), None) => {}
            (Cow::Owned(node), Some(out)) => out.push(node),
            (Cow::Owned(node), None) => {
                let mut fresh = Vec::with_capacity(nodes.len());
                fresh.extend_from_slice(&nodes[..i]);
                fresh.push(node);
                out = Some(fresh);
            }
        }
    }
    Ok(match out {
        Some(nodes) => Cow::Owned(nodes),
        None => Cow::Borrowed(nodes),
    })
}

fn walk_opt<'a, S: Shuttle + ?Sized>(
    shuttle: &S,
    node: Option<&'a Node>,
) -> Result<Option<Cow<'a, Node>>, S::Error> {
    node.map(|node| walk(shuttle, node)).transpose()
}

fn opt_changed(node: &Option<Cow<'_, Node>>) -> bool {
    node.as_ref().is_some_and(changed)
}

fn into_opt(node: Option<Cow<'_, Node>>) -> Option<Node> {
    node.map(Cow::into_owned)
}

fn walk_select<S: Shuttle + ?Sized>(
    shuttle: &S,
    select: &Select,
) -> Result<Option<Select>, S::Error> {
    let items = walk_all(shuttle, &select.items)?;
    let from = walk_opt(shuttle, select.from.as_ref())?;
    let where_clause = walk_opt(shuttle, select.where_clause.as_ref())?;
    let group_by = walk_all(shuttle, &select.group_by)?;
    let having = walk_opt(shuttle, select.having.as_ref())?;

    if !changed(&items)
        && !opt_changed(&from)
        && !opt_changed(&where_clause)
        && !changed(&group_by)
        && !opt_changed(&having)
    {
        return Ok(None);
    }
    Ok(Some(Select {
        distinct: select.distinct,
        items: items.into_owned(),
        from: into_opt(from),
        where_clause: into_opt(where_clause),
        group_by: group_by.into_owned(),
        having: into_opt(having),
    }))
}

fn walk_join<S: Shuttle + ?Sized>(shuttle: &S, join: &Join) -> Result<Option<Join>, S::Error> {
    let left = walk(shuttle, &join.left)?;
    let right = walk(shuttle, &join.right)?;
    let on = match &join.condition {
        JoinCondition::On(expr) => Some(walk(shuttle, expr)?),
        JoinCondition::None | JoinCondition::Using(_) => None,
    };

    if !changed(&left) && !changed(&right) && !opt_changed(&on) {
        return Ok(None);
    }
    let condition = match on {
        Some(expr) => JoinCondition::On(expr.into_owned()),
        None => join.condition.clone(),
    };
    Ok(Some(Join {
        left: left.into_owned(),
        join_type: join.join_type,
        condition,
        right: right.into_owned(),
    }))
}

fn walk_with<S: Shuttle + ?Sized>(shuttle: &S, with: &With) -> Result<Option<With>, S::Error> {
    let queries = with
        .items
        .iter()
        .map(|item| walk(shuttle, &item.query))
        .collect::<Result<Vec<_>, _>>()?;
    let body = walk(shuttle, &with.body)?;

    if !queries.iter().any(changed) && !changed(&body) {
        return Ok(None);
    }
    let items = with
        .items
        .iter()
        .zip(queries)
        .map(|(item, query)| WithItem {
            name: item.name.clone(),
            columns: item.columns.clone(),
            query: query.into_owned(),
        })
        .collect();
    Ok(Some(With {
        items,
        body: body.into_owned(),
    }))
}

fn walk_order_items<'a, S: Shuttle + ?Sized>(
    shuttle: &S,
    items: &'a [OrderItem],
) -> Result<Option<Vec<OrderItem>>, S::Error> {
    let exprs = items
        .iter()
        .map(|item| walk(shuttle, &item.expr))
        .collect::<Result<Vec<_>, _>>()?;
    if !exprs.iter().any(changed) {
        return Ok(None);
    }
    Ok(Some(
        items
            .iter()
            .zip(exprs)
            .map(|(item, expr)| item.with_expr(expr.into_owned()))
            .collect(),
    ))
}

fn walk_order_by<S: Shuttle + ?Sized>(
    shuttle: &S,
    order_by: &OrderBy,
) -> Result<Option<OrderBy>, S::Error> {
    let query = walk(shuttle, &order_by.query)?;
    let items = walk_order_items(shuttle, &order_by.items)?;
    let offset = walk_opt(shuttle, order_by.offset.as_ref())?;
    let fetch = walk_opt(shuttle, order_by.fetch.as_ref())?;

    if !changed(&query) && items.is_none() && !opt_changed(&offset) && !opt_changed(&fetch) {
        return Ok(None);
    }
    Ok(Some(OrderBy {
        query: query.into_owned(),
        items: items.unwrap_or_else(|| order_by.items.clone()),
        offset: into_opt(offset),
        fetch: into_opt(fetch),
    }))
}

fn walk_case<S: Shuttle + ?Sized>(shuttle: &S, case: &Case) -> Result<Option<Case>, S::Error> {
    let operand = walk_opt(shuttle, case.operand.as_ref())?;
    let whens = case
        .whens
        .iter()
        .map(|(when, then)| Ok((walk(shuttle, when)?, walk(shuttle, then)?)))
        .collect::<Result<Vec<_>, S::Error>>()?;
    let else_result = walk_opt(shuttle, case.else_result.as_ref())?;

    let whens_changed = whens
        .iter()
        .any(|(when, then)| changed(when) || changed(then));
    if !opt_changed(&operand) && !whens_changed && !opt_changed(&else_result) {
        return Ok(None);
    }
    Ok(Some(Case {
        operand: into_opt(operand),
        whens: whens
            .into_iter()
            .map(|(when, then)| (when.into_owned(), then.into_owned()))
            .collect(),
        else_result: into_opt(else_result),
    }))
}

fn walk_window<S: Shuttle + ?Sized>(
    shuttle: &S,
    window: &Window,
) -> Result<Option<Window>, S::Error> {
    let partition_by = walk_all(shuttle, &window.partition_by)?;
    let order_by = walk_order_items(shuttle, &window.order_by)?;
    let frame = match &window.frame {
        Some(frame) => walk_frame(shuttle, frame)?,
        None => None,
    };

    if !changed(&partition_by) && order_by.is_none() && frame.is_none() {
        return Ok(None);
    }
    Ok(Some(Window {
        partition_by: partition_by.into_owned(),
        order_by: order_by.unwrap_or_else(|| window.order_by.clone()),
        frame: frame.or_else(|| window.frame.clone()),
    }))
}

fn walk_frame<S: Shuttle + ?Sized>(
    shuttle: &S,
    frame: &WindowFrame,
) -> Result<Option<WindowFrame>, S::Error> {
    let start = walk_bound(shuttle, &frame.start)?;
    let end = match &frame.end {
        Some(end) => walk_bound(shuttle, end)?,
        None => None,
    };
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    Ok(Some(WindowFrame {
        units: frame.units,
        start: start.unwrap_or_else(|| frame.start.clone()),
        end: end.or_else(|| frame.end.clone()),
    }))
}

fn walk_bound<S: Shuttle + ?Sized>(
    shuttle: &S,
    bound: &FrameBound,
) -> Result<Option<FrameBound>, S::Error> {
    Ok(match bound {
        FrameBound::CurrentRow | FrameBound::Preceding(None) | FrameBound::Following(None) => None,
        FrameBound::Preceding(Some(n)) => owned(walk(shuttle, n)?).map(|n| FrameBound::Preceding(Some(n))),
        FrameBound::Following(Some(n)) => owned(walk(shuttle, n)?).map(|n| FrameBound::Following(Some(n))),
    })
}
