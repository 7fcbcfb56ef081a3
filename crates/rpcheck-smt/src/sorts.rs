/// SMT sorts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SmtSort {
    Bool,
    Int,
}

impl std::fmt::Display for SmtSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmtSort::Bool => write!(f, "Bool"),
            SmtSort::Int => write!(f, "Int"),
        }
    }
}

/// SMT-LIB2 logic a script is checked under.
///
/// Floor characterizations multiply two symbolic integers, so obligations
/// over the termination split need non-linear integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtLogic {
    /// Quantifier-free linear integer arithmetic.
    QfLia,
    /// Quantifier-free non-linear integer arithmetic.
    #[default]
    QfNia,
}

impl std::fmt::Display for SmtLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SmtLogic::QfLia => write!(f, "QF_LIA"),
            SmtLogic::QfNia => write!(f, "QF_NIA"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logic_names_match_smtlib() {
        assert_eq!(SmtLogic::QfLia.to_string(), "QF_LIA");
        assert_eq!(SmtLogic::QfNia.to_string(), "QF_NIA");
        assert_eq!(SmtLogic::default(), SmtLogic::QfNia);
    }
}
