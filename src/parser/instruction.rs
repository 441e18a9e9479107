/// Token kinds an instruction node can carry.
///
/// The leading node of every statement carries one of the statement tokens
/// (`Create`, `Drop`, `Select`, ...). The rest describe clauses, operands and
/// literals below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    // Statements
    Create,
    Drop,
    Truncate,
    Insert,
    Select,
    Update,
    Delete,
    Begin,
    Commit,
    Rollback,
    // Targets and modifiers
    Database,
    Table,
    IfNotExists,
    Identifier,
    // Column definitions
    ColumnDef,
    TypeName,
    NotNull,
    PrimaryKey,
    Unique,
    AutoIncrement,
    Default,
    // Clauses
    Into,
    Values,
    Tuple,
    Projection,
    Star,
    Count,
    From,
    Where,
    Set,
    Assign,
    Order,
    Asc,
    Desc,
    Limit,
    Offset,
    // Predicates
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Like,
    In,
    IsNull,
    IsNotNull,
    // Literals
    Number,
    String,
    True,
    False,
    Null,
    Now,
}

/// One node of a parsed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub token: Token,
    pub lexeme: String,
    pub children: Vec<Instruction>,
}

impl Instruction {
    pub fn new(token: Token, lexeme: impl Into<String>) -> Self {
        Self {
            token,
            lexeme: lexeme.into(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// First direct child carrying `token`.
    #[must_use]
    pub fn find(&self, token: Token) -> Option<&Self> {
        self.children.iter().find(|c| c.token == token)
    }

    #[must_use]
    pub fn has(&self, token: Token) -> bool {
        self.find(token).is_some()
    }

    /// The only child, if there is exactly one.
    #[must_use]
    pub fn single_child(&self) -> Option<&Self> {
        match self.children.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}
