use crate::types::{Neighbor, PostPage, PostView};

/// Messages flowing through the app: key-driven intents and the
/// completions posted back by spawned fetches. Completion variants carry
/// the ticket of the fetch that produced them so superseded results can
/// be dropped.
#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    Select,

    // Index
    LoadIndex,
    IndexLoaded(PostPage, u64),
    LoadMore,
    MoreLoaded(PostPage, u64),
    Refresh,

    // Reading screen
    PostLoaded(Box<PostView>, u64),
    PostMissing(String, u64),
    OpenNeighbor(Neighbor),

    // Hand-offs
    OpenInBrowser,
    OpenComments,
    YankUrl,

    // Preview mode
    ExitPreview,

    LoadFailed(String, u64),
    None,
}
