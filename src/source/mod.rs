mod reddit;
mod traits;

pub use reddit::RedditClient;
pub use traits::{Comment, CommentSource};
