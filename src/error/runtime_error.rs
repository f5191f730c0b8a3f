/// Which resource ceiling an execution tripped.
///
/// Distinguishing the two lets a caller phrase the failure as "suspected
/// infinite loop" (time) versus "did far too much work" (operations).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLimit {
    /// The operation counter reached its ceiling.
    Operations,
    /// The wall-clock budget ran out.
    Time,
}

#[derive(Debug)]
/// Represents all errors that can occur during evaluation.
pub enum RuntimeError {
    /// Referenced a name that is neither a bound variable nor anything else.
    UnknownVariable {
        /// The name that failed to resolve.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Called a method that was never defined.
    UnknownMethod {
        /// The method name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Built-in dispatch found no operation with this name for the receiver
    /// kind.
    NoMethodFor {
        /// The method name.
        name: String,
        /// The receiver kind (e.g. `Integer`, `String`).
        kind: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// The wrong number of positional arguments was supplied to a method.
    ArgumentCountMismatch {
        /// How many arguments the call supplied.
        given:    usize,
        /// A description of what the method accepts (e.g. `2`, `1..2`, `2+`).
        expected: String,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// A required keyword argument was not supplied.
    MissingKeywordArgument {
        /// The keyword name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A keyword argument was supplied that the method does not declare.
    UnknownKeywordArgument {
        /// The keyword name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A value had an unexpected or incompatible type.
    TypeError {
        /// Details about the type mismatch.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// Attempted division (or modulo) by zero.
    DivisionByZero {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Integer arithmetic overflowed.
    Overflow {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Assigned to an element outside the bounds of an array.
    IndexOutOfBounds {
        /// The array length at the time of the access.
        len:   usize,
        /// The index that was requested.
        found: i64,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// A mapping key was not a symbol, text or integer.
    InvalidMapKey {
        /// The kind of the offending key value.
        kind: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// `break` or `next` was reached outside any loop or iteration body.
    LoopControlOutsideLoop {
        /// The control keyword (`break` or `next`).
        keyword: String,
        /// The source line where the signal was raised.
        line:    usize,
    },
    /// The execution guard tripped: the program exceeded its operation
    /// ceiling or its wall-clock budget.
    ResourceExceeded {
        /// Which ceiling was hit.
        limit: ResourceLimit,
        /// The source line being evaluated when the guard tripped.
        line:  usize,
    },
}

impl RuntimeError {
    /// Returns `true` when this error is an execution-guard trip, as opposed
    /// to an ordinary programming mistake.
    #[must_use]
    pub const fn is_resource_exceeded(&self) -> bool {
        matches!(self, Self::ResourceExceeded { .. })
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownVariable { name, line } => {
                write!(f, "Error on line {line}: Undefined local variable or method '{name}'.")
            },
            Self::UnknownMethod { name, line } => {
                write!(f, "Error on line {line}: Undefined method '{name}'.")
            },
            Self::NoMethodFor { name, kind, line } => {
                write!(f, "Error on line {line}: Undefined method '{name}' for {kind}.")
            },
            Self::ArgumentCountMismatch { given, expected, line } => {
                write!(
                    f,
                    "Error on line {line}: Wrong number of arguments (given {given}, expected {expected})."
                )
            },
            Self::MissingKeywordArgument { name, line } => {
                write!(f, "Error on line {line}: Missing keyword argument '{name}'.")
            },
            Self::UnknownKeywordArgument { name, line } => {
                write!(f, "Error on line {line}: Unknown keyword argument '{name}'.")
            },
            Self::TypeError { details, line } => {
                write!(f, "Error on line {line}: Type error: {details}.")
            },
            Self::DivisionByZero { line } => write!(f, "Error on line {line}: Division by zero."),
            Self::Overflow { line } => {
                write!(f, "Error on line {line}: Integer overflow while computing result.")
            },
            Self::IndexOutOfBounds { len, found, line } => {
                write!(
                    f,
                    "Error on line {line}: Index {found} out of bounds for array of length {len}."
                )
            },
            Self::InvalidMapKey { kind, line } => {
                write!(
                    f,
                    "Error on line {line}: {kind} cannot be used as a hash key; use a symbol, string or integer."
                )
            },
            Self::LoopControlOutsideLoop { keyword, line } => {
                write!(f, "Error on line {line}: '{keyword}' outside of a loop.")
            },
            Self::ResourceExceeded { limit, line } => match limit {
                ResourceLimit::Operations => {
                    write!(f, "Error on line {line}: Operation limit exceeded (possible infinite loop).")
                },
                ResourceLimit::Time => {
                    write!(f, "Error on line {line}: Time limit exceeded (possible infinite loop).")
                },
            },
        }
    }
}

impl std::error::Error for RuntimeError {}
