//! The parsed filter clauses and their canonical printed form.

use std::fmt;

/// A binary comparison operator of the DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
    /// Spatial "within distance" operator; the right-hand side is a
    /// `lon,lat,distance` triple.
    DWithin,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "<>",
            CompareOp::Lt => "<",
            CompareOp::Leq => "<=",
            CompareOp::Gt => ">",
            CompareOp::Geq => ">=",
            CompareOp::DWithin => "DWITHIN",
        };
        f.write_str(s)
    }
}

/// One parsed clause of a filter string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `object.attribute <op> value`
    Binary { object: String, attribute: String, op: CompareOp, value: String },
    /// `object HAVING (sub-filter)` -- the value is kept opaque and
    /// re-parsed during resolution.
    Having { object: String, value: String },
    /// `AFTER(id)` -- implicitly filters journey-pattern points.
    After { value: String },
    /// `object.method(arg, ...)`
    Method { object: String, method: String, args: Vec<String> },
}

impl Filter {
    /// The DSL object name this clause filters on.
    pub fn object(&self) -> &str {
        match self {
            Filter::Binary { object, .. }
            | Filter::Having { object, .. }
            | Filter::Method { object, .. } => object,
            Filter::After { .. } => "journey_pattern_point",
        }
    }
}

/// Quote a value as a DSL escaped string.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Binary { object, attribute, op, value } => {
                write!(f, "{object}.{attribute} {op} {}", quote(value))
            }
            Filter::Having { object, value } => write!(f, "{object} HAVING ({value})"),
            Filter::After { value } => write!(f, "AFTER({value})"),
            Filter::Method { object, method, args } => {
                write!(f, "{object}.{method}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&quote(arg))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Print a filter list in canonical form: clauses joined with ` AND `.
/// The output re-parses to an equal list.
pub fn print_filters(filters: &[Filter]) -> String {
    filters.iter().map(|filter| filter.to_string()).collect::<Vec<_>>().join(" AND ")
}
