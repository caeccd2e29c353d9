pub type MaterialId = u64;

/// Material descriptor as returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Material {
    pub material_id: MaterialId,
    pub url: String,
    pub name: String,
    pub comment: String,
    pub is_public: bool,
    pub uploader_name: Option<String>,
    pub info_string: Option<String>,
    pub can_set_public: bool,
}

/// A material listed under a form, plus the client-side toggle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialEntry {
    pub material: Material,
    pub is_owner: bool,
    /// "Linked with" label recomputed by the server after an ownership change.
    pub owners: Option<String>,
    /// A team member's upload accepted by the assistant.
    pub team_confirmed: bool,
}

impl MaterialEntry {
    pub fn new(material: Material) -> Self {
        Self {
            material,
            is_owner: false,
            owners: None,
            team_confirmed: false,
        }
    }

    pub fn id(&self) -> MaterialId {
        self.material.material_id
    }
}

/// Target of a material transfer: the `type` posted to the transfer view
/// plus the optional destination and original uploader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferDestination {
    pub kind: String,
    pub dest_id: Option<String>,
    pub from_user: Option<String>,
}

impl TransferDestination {
    /// Move a trace material into the event's own materials.
    pub fn to_event(from_user: Option<String>) -> Self {
        Self {
            kind: "event".to_string(),
            dest_id: None,
            from_user,
        }
    }
}

/// Server answer to an ownership claim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ownership {
    pub is_owner: bool,
    pub owners: Option<String>,
}

/// A failed request. The core only logs the detail; users see a generic notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub detail: String,
}

impl RequestFailure {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
