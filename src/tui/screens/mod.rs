//! TUI screens

mod feedback;
mod gallery;
mod upload;

pub use feedback::FeedbackScreen;
pub use gallery::GalleryScreen;
pub use upload::UploadScreen;
