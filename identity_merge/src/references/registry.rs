//! Declarations of every collection that points at an account

/// Field holding a record's creation time, used to pick which duplicate survives
pub(crate) const CREATED_AT_FIELD: &str = "created_at";

/// Content items users can create, with the shape-dependent places an account
/// id can hide inside them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Backglass,
    Build,
    File,
    Game,
    GameRequest,
    Media,
    Release,
    Rom,
    Tag,
}

impl ContentKind {
    pub const ALL: [ContentKind; 9] = [
        ContentKind::Backglass,
        ContentKind::Build,
        ContentKind::File,
        ContentKind::Game,
        ContentKind::GameRequest,
        ContentKind::Media,
        ContentKind::Release,
        ContentKind::Rom,
        ContentKind::Tag,
    ];

    pub fn collection(&self) -> &'static str {
        match self {
            Self::Backglass => "backglasses",
            Self::Build => "builds",
            Self::File => "files",
            Self::Game => "games",
            Self::GameRequest => "game_requests",
            Self::Media => "media",
            Self::Release => "releases",
            Self::Rom => "roms",
            Self::Tag => "tags",
        }
    }

    /// Content credited to a list of `{user, roles}` authors
    pub fn has_authors(&self) -> bool {
        matches!(self, Self::Release | Self::Backglass)
    }

    /// Content that passes through moderation and keeps a history of decisions
    pub fn has_moderation_history(&self) -> bool {
        matches!(self, Self::Release | Self::Backglass | Self::Rom | Self::Game)
    }

    /// Content whose versioned files carry a validation stamp
    pub fn has_validated_files(&self) -> bool {
        matches!(self, Self::Release)
    }

    fn references(&self) -> Vec<TrackedReference> {
        let collection = self.collection();
        let mut references = vec![TrackedReference::top_level(collection, "created_by")];
        if self.has_authors() {
            references.push(TrackedReference::nested(collection, "authors.user"));
        }
        if self.has_validated_files() {
            references.push(TrackedReference::nested(
                collection,
                "versions.files.validation.validated_by",
            ));
        }
        if self.has_moderation_history() {
            references.push(TrackedReference::nested(
                collection,
                "moderation.history.created_by",
            ));
        }
        references
    }
}

/// How duplicates are folded when two owned records end up on the same target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep the earliest record, holding the rounded mean of `value_field`
    Average { value_field: String },
    /// Keep the earliest record as is
    KeepOne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Scalar account id at an object-only path
    TopLevel { field: String },
    /// Account ids inside arrays of embedded entries
    Nested { path: String },
    /// Records unique per (owner, target)
    Owned {
        field: String,
        target: String,
        policy: DuplicatePolicy,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedReference {
    pub collection: String,
    pub kind: ReferenceKind,
}

impl TrackedReference {
    pub fn top_level(collection: &str, field: &str) -> Self {
        Self {
            collection: collection.to_string(),
            kind: ReferenceKind::TopLevel {
                field: field.to_string(),
            },
        }
    }

    pub fn nested(collection: &str, path: &str) -> Self {
        Self {
            collection: collection.to_string(),
            kind: ReferenceKind::Nested {
                path: path.to_string(),
            },
        }
    }

    pub fn owned(collection: &str, field: &str, target: &str, policy: DuplicatePolicy) -> Self {
        Self {
            collection: collection.to_string(),
            kind: ReferenceKind::Owned {
                field: field.to_string(),
                target: target.to_string(),
                policy,
            },
        }
    }

    /// Path at which the account id is stored
    pub fn path(&self) -> &str {
        match &self.kind {
            ReferenceKind::TopLevel { field } => field,
            ReferenceKind::Nested { path } => path,
            ReferenceKind::Owned { field, .. } => field,
        }
    }
}

/// Every place an account id is stored outside the accounts collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRegistry {
    references: Vec<TrackedReference>,
}

impl ReferenceRegistry {
    pub fn new(references: Vec<TrackedReference>) -> Self {
        Self { references }
    }

    pub fn references(&self) -> &[TrackedReference] {
        &self.references
    }

    /// Distinct collection names, in declaration order
    pub fn collections(&self) -> Vec<&str> {
        let mut collections: Vec<&str> = Vec::new();
        for reference in &self.references {
            if !collections.contains(&reference.collection.as_str()) {
                collections.push(&reference.collection);
            }
        }
        collections
    }
}

impl Default for ReferenceRegistry {
    fn default() -> Self {
        let mut references: Vec<TrackedReference> =
            ContentKind::ALL.iter().flat_map(ContentKind::references).collect();

        references.extend([
            TrackedReference::top_level("comments", "from"),
            TrackedReference::top_level("log_events", "actor"),
            TrackedReference::top_level("log_events", "ref.user"),
            TrackedReference::top_level("log_users", "user"),
            TrackedReference::top_level("log_users", "actor"),
            TrackedReference::top_level("tokens", "created_by"),
            TrackedReference::owned(
                "ratings",
                "from",
                "target",
                DuplicatePolicy::Average {
                    value_field: "value".to_string(),
                },
            ),
            TrackedReference::owned("stars", "from", "target", DuplicatePolicy::KeepOne),
        ]);

        Self::new(references)
    }
}
