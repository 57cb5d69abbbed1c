/// How a relationship field is linked to the related table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKey {
    /// At most one related record. When `inverse` is set, `column` lives on
    /// this table and references the related table's key. Otherwise it lives
    /// on the related table and references this one.
    OneToOne { column: String, inverse: bool },

    /// Any number of related records, each carrying `column` referencing
    /// this table.
    OneToMany { column: String },

    /// Many-to-many through an intermediate table. `left` references this
    /// table and `right` references the related table.
    Through { left: String, right: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    Through,
}

impl ForeignKey {
    pub fn kind(&self) -> RelationKind {
        match self {
            ForeignKey::OneToOne { .. } => RelationKind::OneToOne,
            ForeignKey::OneToMany { .. } => RelationKind::OneToMany,
            ForeignKey::Through { .. } => RelationKind::Through,
        }
    }

    pub fn is_inverse(&self) -> bool {
        matches!(self, ForeignKey::OneToOne { inverse: true, .. })
    }
}

impl RelationKind {
    /// True for relationships loaded by side queries rather than joins.
    pub fn is_batched(self) -> bool {
        !matches!(self, RelationKind::OneToOne)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RelationKind::OneToOne => "OneToOne",
            RelationKind::OneToMany => "OneToMany",
            RelationKind::Through => "Through",
        })
    }
}
