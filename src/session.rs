use crate::error::Result;
use crate::profile::Profile;
use futures::stream::BoxStream;

/// Forward-only response fragments. The stream ending is the normal terminal
/// signal; an `Err` item is the failure signal and nothing follows it.
pub type ChunkStream<'a> = BoxStream<'a, Result<String>>;

/// One ongoing conversation with the remote model.
///
/// The instruction fixed at creation applies to every turn, and the model sees
/// all earlier turns sent through the same session.
pub trait ChatSession: Send {
    fn profile(&self) -> Profile;

    fn system_instruction(&self) -> &str;

    /// Sends `prompt` as the next user turn.
    ///
    /// Concatenating every fragment in order gives the full reply. A failed
    /// stream leaves the session usable for the next call.
    fn send_streaming<'a>(&'a mut self, prompt: &str) -> ChunkStream<'a>;
}

/// Creates a session per profile selection.
pub trait SessionFactory {
    type Session: ChatSession;

    fn create(&self, profile: Profile) -> Self::Session;
}
