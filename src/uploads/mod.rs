//! On-disk storage for uploaded audio
//!
//! Files are written under a dedicated directory with names of the form
//! `<unix-millis>-<random><ext>`, created with create-new semantics so two
//! uploads can never overwrite each other.

mod storage;

pub use storage::{
    is_allowed_mime, StoredFile, UploadStorage, UploadWriter, ALLOWED_MIME_TYPES, DEFAULT_EXTENSION,
};
