mod object_store;

pub use object_store::{
    ObjectStore, PutObjectOptions, PutOutcome, StoredObject, UploadSigner,
    WritePrecondition,
};
