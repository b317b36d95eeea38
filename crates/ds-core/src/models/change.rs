use super::desire::DesireRequest;

/// A single change the differ found between the store and the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Create(DesireRequest),
    Update(DesireRequest),
    Delete(String),
}

impl ChangeEvent {
    pub fn process_guid(&self) -> &str {
        match self {
            ChangeEvent::Create(request) | ChangeEvent::Update(request) => &request.process_guid,
            ChangeEvent::Delete(guid) => guid,
        }
    }
}
