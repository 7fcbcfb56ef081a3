use std::fmt::Write as _;

use crate::sorts::{SmtLogic, SmtSort};
use crate::terms::SmtTerm;

/// Print an SmtTerm as SMT-LIB2 format.
pub fn to_smtlib(term: &SmtTerm) -> String {
    let mut out = String::new();
    write_term(&mut out, term);
    out
}

fn write_term(out: &mut String, term: &SmtTerm) {
    match term {
        SmtTerm::Var(name) => out.push_str(name),
        SmtTerm::IntLit(n) if *n < 0 => {
            let _ = write!(out, "(- {})", n.unsigned_abs());
        }
        SmtTerm::IntLit(n) => {
            let _ = write!(out, "{n}");
        }
        SmtTerm::BoolLit(b) => out.push_str(if *b { "true" } else { "false" }),
        SmtTerm::Arith(op, l, r) => write_app(out, op.symbol(), [l.as_ref(), r.as_ref()]),
        SmtTerm::Cmp(op, l, r) => write_app(out, op.symbol(), [l.as_ref(), r.as_ref()]),
        SmtTerm::Neg(inner) => write_app(out, "-", [inner.as_ref()]),
        SmtTerm::Not(inner) => write_app(out, "not", [inner.as_ref()]),
        SmtTerm::And(terms) => write_nary(out, "and", "true", terms),
        SmtTerm::Or(terms) => write_nary(out, "or", "false", terms),
    }
}

fn write_app<'a>(out: &mut String, head: &str, args: impl IntoIterator<Item = &'a SmtTerm>) {
    out.push('(');
    out.push_str(head);
    for arg in args {
        out.push(' ');
        write_term(out, arg);
    }
    out.push(')');
}

/// Zero operands print as the unit, one operand prints bare.
fn write_nary(out: &mut String, head: &str, unit: &str, terms: &[SmtTerm]) {
    match terms {
        [] => out.push_str(unit),
        [single] => write_term(out, single),
        _ => write_app(out, head, terms),
    }
}

/// Print a sort as SMT-LIB2 format.
pub fn sort_to_smtlib(sort: &SmtSort) -> &'static str {
    match sort {
        SmtSort::Bool => "Bool",
        SmtSort::Int => "Int",
    }
}

/// Render a self-contained SMT-LIB2 script: header comments, logic,
/// declarations, assertions, `(check-sat)` and `(get-model)`.
pub fn to_script(
    logic: SmtLogic,
    comments: &[String],
    declarations: &[(String, SmtSort)],
    assertions: &[SmtTerm],
) -> String {
    let mut out = String::new();
    for line in comments {
        let _ = writeln!(out, "; {line}");
    }
    let _ = writeln!(out, "(set-logic {logic})");
    for (name, sort) in declarations {
        let _ = writeln!(out, "(declare-const {name} {})", sort_to_smtlib(sort));
    }
    for term in assertions {
        out.push_str("(assert ");
        write_term(&mut out, term);
        out.push_str(")\n");
    }
    out.push_str("(check-sat)\n(get-model)\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_simple_term() {
        let term = SmtTerm::var("x").add(SmtTerm::int(1)).ge(SmtTerm::int(0));
        assert_eq!(to_smtlib(&term), "(>= (+ x 1) 0)");
    }

    #[test]
    fn print_and_term() {
        let term = SmtTerm::and(vec![
            SmtTerm::var("a").gt(SmtTerm::int(0)),
            SmtTerm::var("b").lt(SmtTerm::int(10)),
        ]);
        assert_eq!(to_smtlib(&term), "(and (> a 0) (< b 10))");
    }

    #[test]
    fn print_degenerate_connectives() {
        assert_eq!(to_smtlib(&SmtTerm::and(vec![])), "true");
        assert_eq!(to_smtlib(&SmtTerm::or(vec![])), "false");
        let single = SmtTerm::or(vec![SmtTerm::var("p")]);
        assert_eq!(to_smtlib(&single), "p");
        assert_eq!(to_smtlib(&SmtTerm::var("p").not()), "(not p)");
    }

    #[test]
    fn print_negative_literal_and_negation() {
        assert_eq!(to_smtlib(&SmtTerm::int(-7)), "(- 7)");
        assert_eq!(to_smtlib(&SmtTerm::int(i64::MIN)), "(- 9223372036854775808)");
        assert_eq!(to_smtlib(&SmtTerm::var("fee").neg()), "(- fee)");
    }

    #[test]
    fn script_lists_declarations_before_assertions() {
        let script = to_script(
            SmtLogic::QfNia,
            &["property: demo".to_string()],
            &[("x".to_string(), SmtSort::Int)],
            &[SmtTerm::var("x").mul(SmtTerm::var("x")).gt(SmtTerm::int(0))],
        );
        assert_eq!(
            script,
            "; property: demo\n(set-logic QF_NIA)\n(declare-const x Int)\n(assert (> (* x x) 0))\n(check-sat)\n(get-model)\n"
        );
    }
}
