/// Binary integer operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
        }
    }

    /// Exact application; `None` on `i128` overflow.
    pub fn apply(self, lhs: i128, rhs: i128) -> Option<i128> {
        match self {
            ArithOp::Add => lhs.checked_add(rhs),
            ArithOp::Sub => lhs.checked_sub(rhs),
            ArithOp::Mul => lhs.checked_mul(rhs),
        }
    }
}

/// Comparisons. `Eq` also applies to booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    pub fn holds<T: Ord>(self, lhs: T, rhs: T) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }
}

/// Quantifier-free term over integer and boolean constants.
#[derive(Debug, Clone, PartialEq)]
pub enum SmtTerm {
    Var(String),
    IntLit(i64),
    BoolLit(bool),
    Arith(ArithOp, Box<SmtTerm>, Box<SmtTerm>),
    Neg(Box<SmtTerm>),
    Cmp(CmpOp, Box<SmtTerm>, Box<SmtTerm>),
    /// The empty conjunction is `true`.
    And(Vec<SmtTerm>),
    /// The empty disjunction is `false`.
    Or(Vec<SmtTerm>),
    Not(Box<SmtTerm>),
}

#[allow(clippy::should_implement_trait)]
impl SmtTerm {
    pub fn var(name: impl Into<String>) -> Self {
        SmtTerm::Var(name.into())
    }

    pub fn int(n: i64) -> Self {
        SmtTerm::IntLit(n)
    }

    pub fn bool(b: bool) -> Self {
        SmtTerm::BoolLit(b)
    }

    fn arith(op: ArithOp, lhs: SmtTerm, rhs: SmtTerm) -> Self {
        SmtTerm::Arith(op, Box::new(lhs), Box::new(rhs))
    }

    fn cmp(op: CmpOp, lhs: SmtTerm, rhs: SmtTerm) -> Self {
        SmtTerm::Cmp(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn add(self, other: SmtTerm) -> Self {
        Self::arith(ArithOp::Add, self, other)
    }

    pub fn sub(self, other: SmtTerm) -> Self {
        Self::arith(ArithOp::Sub, self, other)
    }

    pub fn mul(self, other: SmtTerm) -> Self {
        Self::arith(ArithOp::Mul, self, other)
    }

    pub fn neg(self) -> Self {
        SmtTerm::Neg(Box::new(self))
    }

    pub fn eq(self, other: SmtTerm) -> Self {
        Self::cmp(CmpOp::Eq, self, other)
    }

    pub fn lt(self, other: SmtTerm) -> Self {
        Self::cmp(CmpOp::Lt, self, other)
    }

    pub fn le(self, other: SmtTerm) -> Self {
        Self::cmp(CmpOp::Le, self, other)
    }

    pub fn gt(self, other: SmtTerm) -> Self {
        Self::cmp(CmpOp::Gt, self, other)
    }

    pub fn ge(self, other: SmtTerm) -> Self {
        Self::cmp(CmpOp::Ge, self, other)
    }

    pub fn and(terms: Vec<SmtTerm>) -> Self {
        SmtTerm::And(terms)
    }

    pub fn or(terms: Vec<SmtTerm>) -> Self {
        SmtTerm::Or(terms)
    }

    pub fn not(self) -> Self {
        SmtTerm::Not(Box::new(self))
    }

    /// Left-folded sum with literal zeros dropped; the empty sum is `0`.
    pub fn sum(terms: impl IntoIterator<Item = SmtTerm>) -> Self {
        let mut iter = terms.into_iter().filter(|t| *t != SmtTerm::IntLit(0));
        match iter.next() {
            None => SmtTerm::int(0),
            Some(first) => iter.fold(first, SmtTerm::add),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sum_is_zero() {
        assert_eq!(SmtTerm::sum(Vec::new()), SmtTerm::int(0));
    }

    #[test]
    fn sum_folds_left() {
        let s = SmtTerm::sum(vec![SmtTerm::var("a"), SmtTerm::var("b"), SmtTerm::var("c")]);
        assert_eq!(
            s,
            SmtTerm::var("a").add(SmtTerm::var("b")).add(SmtTerm::var("c"))
        );
    }

    #[test]
    fn sum_drops_zero_literals() {
        let zeros = SmtTerm::sum(vec![SmtTerm::int(0), SmtTerm::int(0), SmtTerm::int(0)]);
        assert_eq!(zeros, SmtTerm::int(0));
        let s = SmtTerm::sum(vec![
            SmtTerm::int(0),
            SmtTerm::var("split").sub(SmtTerm::var("price")),
            SmtTerm::int(0),
        ]);
        assert_eq!(s, SmtTerm::var("split").sub(SmtTerm::var("price")));
        assert_eq!(
            SmtTerm::sum(vec![SmtTerm::int(-2), SmtTerm::int(0)]),
            SmtTerm::int(-2)
        );
    }

    #[test]
    fn operators_apply_exactly() {
        assert_eq!(ArithOp::Mul.apply(6, 7), Some(42));
        assert_eq!(ArithOp::Add.apply(i128::MAX, 1), None);
        assert!(CmpOp::Le.holds(2, 2));
        assert!(!CmpOp::Lt.holds(2, 2));
        assert!(CmpOp::Eq.holds(true, true));
    }
}
