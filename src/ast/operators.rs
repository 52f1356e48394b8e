use std::collections::BTreeSet;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Stable handle of an operator inside an [`OperatorTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(usize);

impl OpId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Syntactic position an operator occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Applied before a single operand (`-x`)
    Prefix,
    /// Placed between two operands (`a + b`)
    Infix,
    /// Opening half of an encloser pair (`(`)
    Opener,
    /// Closing half of an encloser pair (`)`)
    Closer,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Prefix => "prefix",
            Category::Infix => "infix",
            Category::Opener => "opener",
            Category::Closer => "closer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Associativity {
    Left,
    Right,
    NonAssoc,
}

/// Relation of one operator to another.
///
/// Precedence is a partial relation: two operators that were never related
/// to each other yield [`Precedence::Undefined`], which callers must treat as
/// a conflict rather than pick a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    Equal,
    Lower,
    Higher,
    Undefined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub symbol: String,
    pub category: Category,
    pub assoc: Associativity,
    partner: Option<OpId>,
    equal: BTreeSet<OpId>,
    /// Operators that bind tighter than this one.
    greater: BTreeSet<OpId>,
}

impl Operator {
    /// The other half of an encloser pair.
    pub fn partner(&self) -> Option<OpId> {
        self.partner
    }

    pub fn is_encloser(&self) -> bool {
        matches!(self.category, Category::Opener | Category::Closer)
    }
}

/// Arena of operators together with their pairwise precedence relation.
///
/// # Examples
///
/// ```
/// use kol_lang::ast::{Associativity, OperatorTable, Precedence};
///
/// let mut table = OperatorTable::new();
/// let plus = table.infix("plus", "+", Associativity::Left);
/// let minus = table.infix("minus", "-", Associativity::Left);
/// let mul = table.infix("mul", "*", Associativity::Left);
///
/// table.make_equal(&[plus, minus]);
/// table.make_greater(&[mul], &[plus, minus]);
///
/// assert_eq!(table.precedence_of(mul, plus), Precedence::Higher);
/// assert_eq!(table.precedence_of(minus, mul), Precedence::Lower);
/// assert_eq!(table.precedence_of(plus, minus), Precedence::Equal);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorTable {
    operators: Vec<Operator>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        category: Category,
        assoc: Associativity,
    ) -> OpId {
        let id = OpId(self.operators.len());
        self.operators.push(Operator {
            name: name.into(),
            symbol: symbol.into(),
            category,
            assoc,
            partner: None,
            equal: BTreeSet::new(),
            greater: BTreeSet::new(),
        });
        id
    }

    pub fn infix(&mut self, name: &str, symbol: &str, assoc: Associativity) -> OpId {
        self.add(name, symbol, Category::Infix, assoc)
    }

    pub fn prefix(&mut self, name: &str, symbol: &str) -> OpId {
        self.add(name, symbol, Category::Prefix, Associativity::Right)
    }

    /// Registers an opening/closing pair that reference each other.
    pub fn encloser(
        &mut self,
        open_name: &str,
        open_symbol: &str,
        close_name: &str,
        close_symbol: &str,
    ) -> (OpId, OpId) {
        let open = self.add(open_name, open_symbol, Category::Opener, Associativity::NonAssoc);
        let close = self.add(close_name, close_symbol, Category::Closer, Associativity::NonAssoc);
        self.operators[open.0].partner = Some(close);
        self.operators[close.0].partner = Some(open);
        (open, close)
    }

    /// Makes every operator in `group` mutually equal.
    pub fn make_equal(&mut self, group: &[OpId]) {
        for &a in group {
            for &b in group {
                self.operators[a.0].equal.insert(b);
            }
        }
    }

    /// Makes every operator in `group` bind tighter than every operator in `than`.
    pub fn make_greater(&mut self, group: &[OpId], than: &[OpId]) {
        for &lower in than {
            for &higher in group {
                self.operators[lower.0].greater.insert(higher);
            }
        }
    }

    /// How `a` relates to `b`.
    ///
    /// An operator is always equal to itself; any other pair has to be
    /// related explicitly.
    pub fn precedence_of(&self, a: OpId, b: OpId) -> Precedence {
        let (left, right) = (&self[a], &self[b]);
        if a == b || left.equal.contains(&b) {
            Precedence::Equal
        } else if right.greater.contains(&a) {
            Precedence::Higher
        } else if left.greater.contains(&b) {
            Precedence::Lower
        } else {
            Precedence::Undefined
        }
    }

    pub fn get(&self, id: OpId) -> Option<&Operator> {
        self.operators.get(id.0)
    }

    /// Finds the operator with `symbol` in the given category.
    pub fn find(&self, symbol: &str, category: Category) -> Option<OpId> {
        self.iter()
            .find(|(_, op)| op.symbol == symbol && op.category == category)
            .map(|(id, _)| id)
    }

    pub fn by_name(&self, name: &str) -> Option<OpId> {
        self.iter().find(|(_, op)| op.name == name).map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OpId, &Operator)> {
        self.operators.iter().enumerate().map(|(i, op)| (OpId(i), op))
    }

    /// Symbols of every operator in `category`.
    pub fn symbols(&self, category: Category) -> Vec<String> {
        self.iter()
            .filter(|(_, op)| op.category == category)
            .map(|(_, op)| op.symbol.clone())
            .collect()
    }

    /// Every encloser pair as `(opener, closer)`.
    pub fn encloser_pairs(&self) -> Vec<(OpId, OpId)> {
        self.iter()
            .filter(|(_, op)| op.category == Category::Opener)
            .filter_map(|(id, op)| op.partner.map(|close| (id, close)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl Index<OpId> for OperatorTable {
    type Output = Operator;

    fn index(&self, id: OpId) -> &Operator {
        &self.operators[id.0]
    }
}
