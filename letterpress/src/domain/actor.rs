use uuid::Uuid;

/// The caller role stored on the authors table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Creator,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Creator => "creator",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "creator" => Ok(Self::Creator),
            other => Err(format!("{} is not a valid role", other)),
        }
    }
}

/// The identity on whose behalf a pipeline operation runs. Passed
/// explicitly into every operation instead of being looked up from
/// ambient request state.
#[derive(Debug, Clone, Copy)]
pub enum Actor {
    /// An authenticated author
    Author { id: Uuid, role: Role },
    /// The scheduler, authenticated out-of-band
    System,
}

impl Actor {
    /// Whether this actor may trigger sends and read settings for the
    /// given author's newsletter. Authors manage their own; admins and
    /// the scheduler manage any.
    pub fn can_manage(&self, author_id: Uuid) -> bool {
        match self {
            Self::Author { role: Role::Admin, .. } => true,
            Self::Author { id, .. } => *id == author_id,
            Self::System => true,
        }
    }
}
