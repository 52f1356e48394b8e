// tests/resolver_tests.rs

use kol_lang::ast::Guard;
use kol_lang::resolver::{MAX_NESTING, Resolver};
use kol_lang::{Associativity, Expr, Language, OperatorTable, ResolveError};
use pretty_assertions::assert_eq;

fn render(expr: &Expr, ops: &OperatorTable) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Capture => "_".to_string(),
        Expr::Binary { op, lhs, rhs } => format!(
            "({} {} {})",
            render(lhs, ops),
            ops[*op].symbol,
            render(rhs, ops)
        ),
        Expr::Unary { op, operand } => format!("({}{})", ops[*op].symbol, render(operand, ops)),
        Expr::Enclosed { op, body } => {
            let close = ops[*op].partner().map(|c| ops[c].symbol.as_str()).unwrap_or("?");
            let inner: Vec<String> = body.iter().map(|e| render(e, ops)).collect();
            format!("{}{}{}", ops[*op].symbol, inner.join("; "), close)
        }
        Expr::Call { callee, args } => {
            let callee = callee.as_deref().map(|c| render(c, ops)).unwrap_or_default();
            format!("{}{}", callee, render(args, ops))
        }
        Expr::Function { params, body } => {
            format!("{}{}", render(params, ops), render(body, ops))
        }
        Expr::Conditional { scrutinee, arms } => {
            let mut out = match scrutinee {
                Some(s) => format!("? {}", render(s, ops)),
                None => "?".to_string(),
            };
            for arm in arms {
                let guard = match &arm.guard {
                    Guard::CatchAll => "...".to_string(),
                    Guard::Test(e) => render(e, ops),
                };
                out.push_str(&format!(" | {} => {}", guard, render(&arm.body, ops)));
            }
            out
        }
    }
}

fn resolve(source: &str) -> Result<Vec<String>, ResolveError> {
    let kol = Language::standard().unwrap();
    let cst = kol.parse(source).unwrap();
    let statements = Resolver::new(kol.operators()).statements(&cst)?;
    Ok(statements.iter().map(|e| render(e, kol.operators())).collect())
}

fn resolve_one(source: &str) -> String {
    let mut statements = resolve(source).unwrap();
    assert_eq!(statements.len(), 1, "expected a single statement in {:?}", source);
    statements.remove(0)
}

// ============================================================================
// Precedence and associativity
// ============================================================================

#[test]
fn test_left_associative_chain() {
    assert_eq!(resolve_one("a + b - c"), "((a + b) - c)");
    assert_eq!(resolve_one("a - b - c - d"), "(((a - b) - c) - d)");
}

#[test]
fn test_higher_precedence_binds_tighter() {
    assert_eq!(resolve_one("a + b * c"), "(a + (b * c))");
    assert_eq!(resolve_one("a * b + c"), "((a * b) + c)");
    assert_eq!(resolve_one("a + b * c - d / e"), "((a + (b * c)) - (d / e))");
}

#[test]
fn test_assignment_is_lowest_and_right_associative() {
    assert_eq!(resolve_one("x = a + b"), "(x = (a + b))");
    assert_eq!(resolve_one("a = b = c"), "(a = (b = c))");
}

#[test]
fn test_comparison_between_arithmetic() {
    assert_eq!(resolve_one("a + 1 < b * 2"), "((a + 1) < (b * 2))");
    assert_eq!(resolve_one("r = a == b"), "(r = (a == b))");
}

#[test]
fn test_non_associative_chain_is_rejected() {
    assert_eq!(
        resolve("a < b < c"),
        Err(ResolveError::NonAssociative {
            operator: "<".to_string()
        })
    );
    assert_eq!(
        resolve("a < b == c"),
        Err(ResolveError::NonAssociative {
            operator: "==".to_string()
        })
    );
}

#[test]
fn test_unrelated_operators_conflict() {
    let mut table = OperatorTable::new();
    let at = table.infix("at", "@", Associativity::Left);
    let hash = table.infix("hash", "#", Associativity::Left);
    let resolver = Resolver::new(&table);

    let err = resolver
        .reassociate(vec![Expr::ident("a"), Expr::ident("b"), Expr::ident("c")], vec![at, hash])
        .unwrap_err();
    assert_eq!(
        err,
        ResolveError::PrecedenceConflict {
            left: "@".to_string(),
            right: "#".to_string()
        }
    );
}

#[test]
fn test_reassociate_single_operand() {
    let table = OperatorTable::new();
    let resolver = Resolver::new(&table);
    assert_eq!(resolver.reassociate(vec![Expr::ident("a")], vec![]), Ok(Expr::ident("a")));
    assert_eq!(resolver.reassociate(vec![], vec![]), Err(ResolveError::MalformedChain));
}

#[test]
fn test_self_related_operator_follows_associativity() {
    let mut table = OperatorTable::new();
    let pow = table.infix("pow", "^", Associativity::Right);
    let resolver = Resolver::new(&table);
    let tree = resolver
        .reassociate(vec![Expr::ident("a"), Expr::ident("b"), Expr::ident("c")], vec![pow, pow])
        .unwrap();
    assert_eq!(render(&tree, &table), "(a ^ (b ^ c))");
}

// ============================================================================
// Operands
// ============================================================================

#[test]
fn test_prefix_operator_binds_to_operand() {
    assert_eq!(resolve_one("-a * b"), "((-a) * b)");
    assert_eq!(resolve_one("a - -b"), "(a - (-b))");
    assert_eq!(resolve_one("- - a"), "(-(-a))");
}

#[test]
fn test_grouping_overrides_precedence() {
    // The group itself renders as an anonymous call: `(...)`.
    assert_eq!(resolve_one("(a + b) * c"), "(((a + b)) * c)");
    assert_eq!(resolve_one("a * (b + c)"), "(a * ((b + c)))");
}

#[test]
fn test_call_arguments() {
    assert_eq!(resolve_one("f(a, b + 1)"), "f((a , (b + 1)))");
    assert_eq!(resolve_one("f()"), "f()");
}

#[test]
fn test_any_operand_can_be_called() {
    assert_eq!(resolve_one("mk()(2)"), "mk()(2)");
    assert_eq!(resolve_one("f(1)(2)(3)"), "f(1)(2)(3)");
    assert_eq!(resolve_one("[x]{ x }(3)"), "[x]{x}(3)");
    assert_eq!(resolve_one("(f)(2) + 1"), "((f)(2) + 1)");
    assert_eq!(resolve_one("-f(1)"), "(-f(1))");
}

#[test]
fn test_function_literal() {
    assert_eq!(resolve_one("[a, b]{ a * b }"), "[(a , b)]{(a * b)}");
    assert_eq!(resolve_one("[]{}"), "[]{}");
}

#[test]
fn test_block_statements() {
    assert_eq!(resolve_one("[x]{ y = x; y + 1 }"), "[x]{(y = x); (y + 1)}");
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_statement_lists() {
    assert_eq!(resolve("a; b; c").unwrap(), vec!["a", "b", "c"]);
    assert_eq!(resolve("a; b;").unwrap(), vec!["a", "b"]);
    assert_eq!(resolve("x = 1").unwrap(), vec!["(x = 1)"]);
}

#[test]
fn test_long_statement_list_is_flat() {
    let source = "x = 1;\n".repeat(800);
    let statements = resolve(&source).unwrap();
    assert_eq!(statements.len(), 800);
    assert!(statements.iter().all(|s| s == "(x = 1)"));
}

// ============================================================================
// Nesting limits
// ============================================================================

#[test]
fn test_long_chain_exceeds_nesting_limit() {
    let source = vec!["1"; 5000].join(" + ");
    assert_eq!(resolve(&source), Err(ResolveError::TooDeep { limit: MAX_NESTING }));
}

#[test]
fn test_chain_within_nesting_limit() {
    let source = vec!["1"; 200].join(" + ");
    let rendered = resolve_one(&source);
    assert!(rendered.starts_with(&"(".repeat(199)));
}

// ============================================================================
// Conditional chains
// ============================================================================

#[test]
fn test_partial_left_guard_captures_scrutinee() {
    assert_eq!(
        resolve_one("? x | > 0 => { 1 } | ... => { 0 }"),
        "? x | (_ > 0) => {1} | ... => {0}"
    );
}

#[test]
fn test_partial_right_guard_captures_scrutinee() {
    assert_eq!(resolve_one("? x | 10 < => { 1 }"), "? x | (10 < _) => {1}");
}

#[test]
fn test_partial_guard_chain_is_reassociated() {
    assert_eq!(resolve_one("? x | > 1 + 1 => { 1 }"), "? x | (_ > (1 + 1)) => {1}");
    assert_eq!(resolve_one("? x | + 1 * 2 => { 1 }"), "? x | (_ + (1 * 2)) => {1}");
    assert_eq!(resolve_one("? x | a + 1 < => { 1 }"), "? x | ((a + 1) < _) => {1}");
}

#[test]
fn test_full_guard_without_scrutinee() {
    assert_eq!(
        resolve_one("? | a > 1 => { 1 } | ... => { 2 }"),
        "? | (a > 1) => {1} | ... => {2}"
    );
}

#[test]
fn test_conditional_as_operand() {
    assert_eq!(
        resolve_one("y = ? x | == 0 => { 1 } | ... => { 2 }"),
        "(y = ? x | (_ == 0) => {1} | ... => {2})"
    );
}
