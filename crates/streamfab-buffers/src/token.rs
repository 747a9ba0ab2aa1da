use uuid::Uuid;

/// A single reader's single-consumption handle into a buffer.
///
/// Each token tracks, inside the buffer it was issued from, the generation
/// it last observed; it carries no state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventToken(pub(crate) Uuid);

impl EventToken {
    pub(crate) fn new() -> Self {
        EventToken(Uuid::new_v4())
    }
}
