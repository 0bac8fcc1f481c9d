pub mod draft;
pub mod resume;

pub use draft::{DraftEducation, DraftExperience, DraftHeader, DraftMetadata, DraftProject, DraftResume};
pub use resume::{
    Education, Experience, Header, Links, Metadata, OtherSection, Project, ResumeDocument, Skills,
    ALLOWED_ROOT_KEYS,
};
